use ethnum::{I256, U256};
use std::fmt;
use troncrypt::Address;

/// A typed ABI value.
///
/// Encoding is lenient about representation (an address may be given as a base58 string, an integer
/// as a decimal string); decoding always yields the canonical variant for the declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Address(Address),
    Bool(bool),
    Uint(U256),
    Int(I256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Value::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Value::Uint(v) => Some(*v),
            Value::Int(v) if *v >= I256::ZERO => Some(U256::from_be_bytes(v.to_be_bytes())),
            _ => None,
        }
    }

    pub fn as_i256(&self) -> Option<I256> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Uint(v) if *v <= U256::from_be_bytes(I256::MAX.to_be_bytes()) => {
                Some(I256::from_be_bytes(v.to_be_bytes()))
            }
            _ => None,
        }
    }

    /// The value as a `u64`, if it is a non-negative integer that fits.
    pub fn as_u64(&self) -> Option<u64> {
        let v = self.as_u256()?;
        if v > U256::from(u64::MAX) {
            return None;
        }
        let bytes = v.to_be_bytes();
        let mut low = [0u8; 8];
        low.copy_from_slice(&bytes[24..]);
        Some(u64::from_be_bytes(low))
    }

    /// The value as an `i64`, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        let v = self.as_i256()?;
        if v > I256::from(i64::MAX) || v < I256::from(i64::MIN) {
            return None;
        }
        let bytes = v.to_be_bytes();
        let mut low = [0u8; 8];
        low.copy_from_slice(&bytes[24..]);
        Some(i64::from_be_bytes(low))
    }

    pub fn as_u8(&self) -> Option<u8> {
        self.as_u64().and_then(|v| u8::try_from(v).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) | Value::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }
}

/// Human-facing rendering: decimal integers, base58 addresses, unprefixed lowercase hex bytes.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Address(a) => f.write_str(a.as_base58()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Uint(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::FixedBytes(b) | Value::Bytes(b) => f.write_str(&hex::encode(b)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Uint(U256::from(v as u128))
            }
        })*
    };
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(I256::from(v as i128))
            }
        })*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, u128, usize);
impl_from_signed!(i8, i16, i32, i64, i128, isize);

impl From<U256> for Value {
    fn from(v: U256) -> Self {
        Value::Uint(v)
    }
}

impl From<I256> for Value {
    fn from(v: I256) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Address> for Value {
    fn from(v: Address) -> Self {
        Value::Address(v)
    }
}

impl From<&Address> for Value {
    fn from(v: &Address) -> Self {
        Value::Address(v.clone())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_accessors() {
        assert_eq!(Value::from(200u8).as_u8(), Some(200));
        assert_eq!(Value::from(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(Value::Uint(U256::from(u64::MAX) + U256::ONE).as_u64(), None);
        assert_eq!(Value::from(-5i32).as_i64(), Some(-5));
        assert_eq!(Value::from(-5i32).as_u64(), None);
        assert_eq!(Value::from(7i32).as_u64(), Some(7));
        assert_eq!(Value::Uint(U256::MAX).as_i256(), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::from(1234u32).to_string(), "1234");
        assert_eq!(Value::from(-1i8).to_string(), "-1");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "dead");
        assert_eq!(
            Value::Address(Address::from_evm([0u8; 20])).to_string(),
            "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb"
        );
        assert_eq!(
            Value::Array(vec![Value::from(1u8), Value::from(2u8)]).to_string(),
            "[1,2]"
        );
    }
}
