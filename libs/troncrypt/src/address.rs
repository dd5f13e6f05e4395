use once_cell::sync::OnceCell;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::convert::TryInto;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

use crate::{base58check_decode, base58check_encode, strip_hex_prefix};

/// First byte of every 21-byte address.
pub const ADDRESS_PREFIX: u8 = 0x41;
/// Length of the chain form.
pub const ADDRESS_LEN: usize = 21;
/// Length of the EVM form.
pub const EVM_ADDRESS_LEN: usize = 20;
/// Length of the base58-check form.
pub const BASE58_ADDRESS_LEN: usize = 34;

/// Error concerning the parsing of addresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address length ({0})")]
    InvalidLength(usize),
    #[error("invalid address prefix byte 0x{0:02x}")]
    InvalidPrefix(u8),
    #[error("base58 address must start with 'T'")]
    InvalidLeadingChar,
    #[error("invalid base58 string")]
    InvalidBase58,
    #[error("invalid hex string")]
    InvalidHex,
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

/// A 21-byte account address: the prefix byte `0x41` followed by the 20-byte EVM form.
///
/// The base58-check text form is computed at most once and cached. Equality, ordering and hashing only look at the bytes.
#[derive(Clone)]
pub struct Address {
    bytes: [u8; ADDRESS_LEN],
    base58: OnceCell<String>,
}

impl Address {
    fn from_array(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self {
            bytes,
            base58: OnceCell::new(),
        }
    }

    /// Parses the 34-character base58-check form.
    pub fn from_base58(s: &str) -> Result<Self, AddressError> {
        if s.len() != BASE58_ADDRESS_LEN {
            return Err(AddressError::InvalidLength(s.len()));
        }
        if !s.starts_with('T') {
            return Err(AddressError::InvalidLeadingChar);
        }
        let raw = crate::base58_decode(s).ok_or(AddressError::InvalidBase58)?;
        if raw.len() != ADDRESS_LEN + 4 {
            return Err(AddressError::InvalidLength(raw.len()));
        }
        if raw[0] != ADDRESS_PREFIX {
            return Err(AddressError::InvalidPrefix(raw[0]));
        }
        let payload = base58check_decode(s)?;
        let bytes: [u8; ADDRESS_LEN] = payload
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(payload.len()))?;
        let addr = Self::from_array(bytes);
        let _ = addr.base58.set(s.to_owned());
        Ok(addr)
    }

    /// Parses a hex string of either 21 bytes (prefixed form) or 20 bytes (EVM form). A leading `0x` is optional.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let raw = hex::decode(strip_hex_prefix(s)).map_err(|_| AddressError::InvalidHex)?;
        Self::from_bytes(&raw)
    }

    /// Accepts 21 bytes starting with the prefix, or a 20-byte EVM address.
    pub fn from_bytes(b: &[u8]) -> Result<Self, AddressError> {
        match b.len() {
            ADDRESS_LEN => {
                if b[0] != ADDRESS_PREFIX {
                    return Err(AddressError::InvalidPrefix(b[0]));
                }
                let mut bytes = [0u8; ADDRESS_LEN];
                bytes.copy_from_slice(b);
                Ok(Self::from_array(bytes))
            }
            EVM_ADDRESS_LEN => {
                let mut evm = [0u8; EVM_ADDRESS_LEN];
                evm.copy_from_slice(b);
                Ok(Self::from_evm(evm))
            }
            n => Err(AddressError::InvalidLength(n)),
        }
    }

    /// Builds an address from its EVM form. Never fails.
    pub fn from_evm(evm: [u8; EVM_ADDRESS_LEN]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(&evm);
        Self::from_array(bytes)
    }

    /// Like `from_base58`, but panics on invalid input. Only for trusted constants.
    pub fn must_from_base58(s: &str) -> Self {
        Self::from_base58(s).unwrap_or_else(|e| panic!("invalid base58 address {:?}: {}", s, e))
    }

    /// Like `from_hex`, but panics on invalid input. Only for trusted constants.
    pub fn must_from_hex(s: &str) -> Self {
        Self::from_hex(s).unwrap_or_else(|e| panic!("invalid hex address {:?}: {}", s, e))
    }

    /// Like `from_bytes`, but panics on invalid input. Only for trusted constants.
    pub fn must_from_bytes(b: &[u8]) -> Self {
        Self::from_bytes(b).unwrap_or_else(|e| panic!("invalid address bytes: {}", e))
    }

    /// The cached base58-check form.
    pub fn as_base58(&self) -> &str {
        self.base58.get_or_init(|| base58check_encode(&self.bytes))
    }

    /// The 34-character base58-check form, starting with `T`.
    pub fn to_base58(&self) -> String {
        self.as_base58().to_owned()
    }

    /// The 21-byte form, starting with `0x41`.
    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The trailing 20 bytes, as seen by the contract VM.
    pub fn to_evm_bytes(&self) -> [u8; EVM_ADDRESS_LEN] {
        let mut evm = [0u8; EVM_ADDRESS_LEN];
        evm.copy_from_slice(&self.bytes[1..]);
        evm
    }

    /// 42 lowercase hex characters without a `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// 40 lowercase hex characters of the EVM form.
    pub fn to_evm_hex(&self) -> String {
        hex::encode(&self.bytes[1..])
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state)
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("Address({})", self.as_base58()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_base58())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Base58 when the string looks like one, hex otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == BASE58_ADDRESS_LEN && s.starts_with('T') {
            Self::from_base58(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl From<[u8; EVM_ADDRESS_LEN]> for Address {
    fn from(evm: [u8; EVM_ADDRESS_LEN]) -> Self {
        Self::from_evm(evm)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::*;

    const ZERO_BASE58: &str = "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb";
    const USDT_BASE58: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
    const USDT_HEX: &str = "41a614f803b6fd780986a42c78ec9c7f77e6ded13c";

    #[test]
    fn known_addresses() {
        let zero = Address::from_evm([0u8; 20]);
        assert_eq!(zero.to_base58(), ZERO_BASE58);
        let usdt = Address::from_base58(USDT_BASE58).unwrap();
        assert_eq!(usdt.to_hex(), USDT_HEX);
        assert_eq!(Address::from_hex(USDT_HEX).unwrap().to_base58(), USDT_BASE58);
    }

    #[test]
    fn conversions_roundtrip() {
        let addr = Address::from_base58("TLyqzVGLV1srkB7dToTAEqgDSfPtXRJZYH").unwrap();
        let hex_form = addr.to_hex();
        assert_eq!(hex_form.len(), 42);
        assert!(hex_form.starts_with("41"));
        let evm_hex = addr.to_evm_hex();
        assert_eq!(evm_hex.len(), 40);
        assert_eq!(evm_hex, hex_form[2..]);
        assert_eq!(Address::from_hex(&hex_form).unwrap(), addr);
        assert_eq!(Address::from_hex(&evm_hex).unwrap(), addr);
        assert_eq!(Address::from_hex(&format!("0x{}", evm_hex)).unwrap(), addr);
        assert_eq!(
            Address::from_hex(&hex_form.to_uppercase()).unwrap().to_base58(),
            "TLyqzVGLV1srkB7dToTAEqgDSfPtXRJZYH"
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Address::from_base58("TLyqzVGLV1srkB7dToTAEqgDSfPtXRJZY"),
            Err(AddressError::InvalidLength(33))
        );
        assert_eq!(
            Address::from_base58("XLyqzVGLV1srkB7dToTAEqgDSfPtXRJZYH"),
            Err(AddressError::InvalidLeadingChar)
        );
        assert_eq!(
            Address::from_base58("TLyqzVGLV1srkB7dToTAEqgDSfPtXRJZYh"),
            Err(AddressError::ChecksumMismatch)
        );
        assert_eq!(
            Address::from_base58("TLyqzVGLV1srkB7dToTAEqgDSfPtXRJZY0"),
            Err(AddressError::InvalidBase58)
        );
        let mut bad = [0u8; 21];
        bad[0] = 0x42;
        assert_eq!(
            Address::from_hex(&hex::encode(bad)),
            Err(AddressError::InvalidPrefix(0x42))
        );
        assert_eq!(Address::from_hex("41abcd"), Err(AddressError::InvalidLength(3)));
        assert_eq!(Address::from_hex("xyz"), Err(AddressError::InvalidHex));
        assert_eq!(Address::from_bytes(&[0x41; 22]), Err(AddressError::InvalidLength(22)));
    }

    #[test]
    #[should_panic]
    fn must_variant_panics() {
        Address::must_from_base58("not an address");
    }

    #[test]
    fn serde_uses_base58() {
        let addr = Address::from_base58(USDT_BASE58).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", USDT_BASE58));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        let from_hex: Address = serde_json::from_str(&format!("\"{}\"", USDT_HEX)).unwrap();
        assert_eq!(from_hex, addr);
    }

    #[quickcheck]
    fn every_form_roundtrips(seed: Vec<u8>) -> bool {
        let evm: [u8; 20] = crate::keccak256(&seed).0[12..].try_into().unwrap();
        let addr = Address::from_evm(evm);
        let b58 = addr.to_base58();
        addr.to_bytes()[0] == ADDRESS_PREFIX
            && b58.len() == BASE58_ADDRESS_LEN
            && b58.starts_with('T')
            && Address::from_bytes(&addr.to_bytes()).unwrap() == addr
            && Address::from_base58(&b58).unwrap() == addr
            && Address::from_hex(&addr.to_hex()).unwrap() == addr
            && Address::from_evm(addr.to_evm_bytes()) == addr
    }
}
