use std::fmt;
use std::str::FromStr;

use crate::{AbiError, Result};

/// A parsed ABI type string. Arrays nest at most one level.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    Address,
    Bool,
    String,
    Bytes,
    /// `bytesN`, 1 ≤ N ≤ 32.
    FixedBytes(usize),
    /// `uintN` with the width in bits.
    Uint(usize),
    /// `intN` with the width in bits.
    Int(usize),
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[k]`
    FixedArray(Box<ParamType>, usize),
}

impl ParamType {
    /// Parses a type string such as `uint256`, `bytes32`, `address[]`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(prefix) = s.strip_suffix(']') {
            let open = prefix
                .rfind('[')
                .ok_or_else(|| AbiError::UnknownType(s.to_owned()))?;
            let inner = Self::parse_elementary(&prefix[..open])
                .map_err(|_| AbiError::UnknownType(s.to_owned()))?;
            let len = &prefix[open + 1..];
            return if len.is_empty() {
                Ok(ParamType::Array(Box::new(inner)))
            } else {
                match len.parse::<usize>() {
                    Ok(k) if k > 0 => Ok(ParamType::FixedArray(Box::new(inner), k)),
                    _ => Err(AbiError::UnknownType(s.to_owned())),
                }
            };
        }
        Self::parse_elementary(s)
    }

    fn parse_elementary(s: &str) -> Result<Self> {
        let unknown = || AbiError::UnknownType(s.to_owned());
        match s {
            "address" => return Ok(ParamType::Address),
            "bool" => return Ok(ParamType::Bool),
            "string" => return Ok(ParamType::String),
            "bytes" => return Ok(ParamType::Bytes),
            "uint" | "trcToken" => return Ok(ParamType::Uint(256)),
            "int" => return Ok(ParamType::Int(256)),
            _ => {}
        }
        if let Some(n) = s.strip_prefix("bytes") {
            let n: usize = n.parse().map_err(|_| unknown())?;
            if (1..=32).contains(&n) {
                return Ok(ParamType::FixedBytes(n));
            }
        } else if let Some(bits) = s.strip_prefix("uint") {
            return Self::int_width(bits).map(ParamType::Uint).ok_or_else(unknown);
        } else if let Some(bits) = s.strip_prefix("int") {
            return Self::int_width(bits).map(ParamType::Int).ok_or_else(unknown);
        }
        Err(unknown())
    }

    fn int_width(bits: &str) -> Option<usize> {
        let bits: usize = bits.parse().ok()?;
        if bits > 0 && bits <= 256 && bits % 8 == 0 {
            Some(bits)
        } else {
            None
        }
    }

    /// Whether the value lives in the tail of a head-tail encoding.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::String | ParamType::Bytes | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            _ => false,
        }
    }

    /// Size in bytes of this type's slot in the head.
    pub fn head_size(&self) -> usize {
        match self {
            ParamType::FixedArray(inner, k) if !inner.is_dynamic() => inner.head_size() * k,
            _ => 32,
        }
    }

    /// Parses every type string of a list.
    pub fn parse_all<S: AsRef<str>>(types: &[S]) -> Result<Vec<Self>> {
        types.iter().map(|t| Self::parse(t.as_ref())).collect()
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::String => f.write_str("string"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::FixedBytes(n) => write!(f, "bytes{}", n),
            ParamType::Uint(bits) => write!(f, "uint{}", bits),
            ParamType::Int(bits) => write!(f, "int{}", bits),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
            ParamType::FixedArray(inner, k) => write!(f, "{}[{}]", inner, k),
        }
    }
}

impl FromStr for ParamType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elementary_types() {
        assert_eq!(ParamType::parse("address").unwrap(), ParamType::Address);
        assert_eq!(ParamType::parse("uint8").unwrap(), ParamType::Uint(8));
        assert_eq!(ParamType::parse("int128").unwrap(), ParamType::Int(128));
        assert_eq!(ParamType::parse("uint").unwrap(), ParamType::Uint(256));
        assert_eq!(ParamType::parse("trcToken").unwrap(), ParamType::Uint(256));
        assert_eq!(ParamType::parse("bytes32").unwrap(), ParamType::FixedBytes(32));
        assert_eq!(ParamType::parse("bytes").unwrap(), ParamType::Bytes);
    }

    #[test]
    fn parses_arrays() {
        assert_eq!(
            ParamType::parse("address[]").unwrap(),
            ParamType::Array(Box::new(ParamType::Address))
        );
        assert_eq!(
            ParamType::parse("uint256[3]").unwrap(),
            ParamType::FixedArray(Box::new(ParamType::Uint(256)), 3)
        );
        assert!(ParamType::parse("uint256[][]").is_err());
        assert!(ParamType::parse("uint256[0]").is_err());
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["uint7", "uint264", "bytes33", "bytes0", "tuple", "int0", "foo[]", ""] {
            assert!(ParamType::parse(bad).is_err(), "{} should fail", bad);
        }
    }

    #[test]
    fn dynamic_and_head_sizes() {
        let fixed = ParamType::parse("uint256[3]").unwrap();
        assert!(!fixed.is_dynamic());
        assert_eq!(fixed.head_size(), 96);
        let dyn_fixed = ParamType::parse("string[2]").unwrap();
        assert!(dyn_fixed.is_dynamic());
        assert_eq!(dyn_fixed.head_size(), 32);
        assert!(ParamType::parse("bytes").unwrap().is_dynamic());
        assert_eq!(ParamType::parse("address[]").unwrap().to_string(), "address[]");
    }
}
