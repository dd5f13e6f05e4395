use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::convert::TryInto;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use tiny_keccak::{Hasher, Keccak};

use crate::AddressError;

/// A 32-byte digest. Transaction ids, event topics, and message hashes are all `HashVal`s.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct HashVal(pub [u8; 32]);

impl HashVal {
    /// Lowercase hex, 64 characters, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses 64 hex characters, with an optional `0x`/`0X` prefix.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = strip_hex_prefix(s);
        if s.len() != 64 {
            return None;
        }
        Some(HashVal(hex::decode(s).ok()?.as_slice().try_into().ok()?))
    }

    /// Copies a 32-byte slice.
    pub fn from_slice(bts: &[u8]) -> Option<Self> {
        Some(HashVal(bts.try_into().ok()?))
    }
}

impl Deref for HashVal {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for HashVal {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for HashVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("#<{}>", hex::encode(&self.0[0..5])))
    }
}

impl fmt::Display for HashVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for HashVal {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or(hex::FromHexError::InvalidStringLength)
    }
}

/// Strips a leading `0x` or `0X`.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Keccak-256, as used by the contract VM.
pub fn keccak256(data: &[u8]) -> HashVal {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    HashVal(out)
}

/// SHA-256.
pub fn sha256(data: &[u8]) -> HashVal {
    HashVal(Sha256::digest(data).into())
}

/// SHA-256 applied twice, used by the base58-check checksum.
pub fn double_sha256(data: &[u8]) -> HashVal {
    sha256(&sha256(data).0)
}

/// Plain base58 (Bitcoin alphabet).
pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Plain base58 decode. Returns `None` on characters outside the alphabet.
pub fn base58_decode(s: &str) -> Option<Vec<u8>> {
    bs58::decode(s).into_vec().ok()
}

/// Appends the first four bytes of `SHA256(SHA256(payload))` and base58-encodes the result.
pub fn base58check_encode(payload: &[u8]) -> String {
    let checksum = double_sha256(payload);
    let mut buf = Vec::with_capacity(payload.len() + 4);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum.0[..4]);
    base58_encode(&buf)
}

/// Decodes a base58-check string and verifies its trailing 4-byte checksum.
pub fn base58check_decode(s: &str) -> Result<Vec<u8>, AddressError> {
    let mut raw = base58_decode(s).ok_or(AddressError::InvalidBase58)?;
    if raw.len() < 5 {
        return Err(AddressError::InvalidLength(raw.len()));
    }
    let split = raw.len() - 4;
    let checksum = double_sha256(&raw[..split]);
    if checksum.0[..4] != raw[split..] {
        return Err(AddressError::ChecksumMismatch);
    }
    raw.truncate(split);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_known_vectors() {
        assert_eq!(
            keccak256(b"").to_hex(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            &keccak256(b"transfer(address,uint256)").to_hex()[..8],
            "a9059cbb"
        );
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hashval_hex_prefixes() {
        let h = sha256(b"abc");
        assert_eq!(HashVal::from_hex(&h.to_hex()), Some(h));
        assert_eq!(HashVal::from_hex(&format!("0x{}", h)), Some(h));
        assert_eq!(HashVal::from_hex(&format!("0X{}", h)), Some(h));
        assert_eq!(HashVal::from_hex("abcd"), None);
        assert_eq!(HashVal::from_hex(&"zz".repeat(32)), None);
    }

    #[test]
    fn base58check_detects_corruption() {
        let encoded = base58check_encode(b"hello world");
        assert_eq!(base58check_decode(&encoded).unwrap(), b"hello world");
        let mut raw = base58_decode(&encoded).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 1;
        assert_eq!(
            base58check_decode(&base58_encode(&raw)),
            Err(AddressError::ChecksumMismatch)
        );
        assert_eq!(base58check_decode("0OIl"), Err(AddressError::InvalidBase58));
    }
}
