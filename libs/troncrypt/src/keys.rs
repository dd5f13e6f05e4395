use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use std::convert::TryInto;
use std::fmt;
use thiserror::Error;

use crate::{keccak256, strip_hex_prefix, Address, HashVal, EVM_ADDRESS_LEN};

/// Prefix of a personal-signed message, before the decimal message length.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19TRON Signed Message:\n";

/// Offset between the internal recovery id and the `V` byte on the wire.
pub const WIRE_V_OFFSET: u8 = 27;

/// Error concerning keys and signatures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid signature length ({0})")]
    InvalidSignatureLength(usize),
    #[error("invalid recovery byte {0}")]
    InvalidRecoveryByte(u8),
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    #[error("public key recovery failed")]
    RecoveryFailed,
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Takes the last 20 bytes of `keccak256(pubkey[1..])` for a 65-byte uncompressed SEC1 public key.
pub fn pubkey_to_evm(uncompressed: &[u8]) -> Result<[u8; EVM_ADDRESS_LEN], CryptoError> {
    if uncompressed.len() != 65 || uncompressed[0] != 0x04 {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected 65-byte uncompressed key, got {} bytes",
            uncompressed.len()
        )));
    }
    let hash = keccak256(&uncompressed[1..]);
    let mut evm = [0u8; EVM_ADDRESS_LEN];
    evm.copy_from_slice(&hash.0[12..]);
    Ok(evm)
}

/// Decodes a message given either as raw text or as `0x`-prefixed hex.
pub fn message_bytes(message: &str) -> Result<Vec<u8>, CryptoError> {
    match message.strip_prefix("0x") {
        Some(hexpart) => {
            hex::decode(hexpart).map_err(|e| CryptoError::InvalidHex(e.to_string()))
        }
        None => Ok(message.as_bytes().to_vec()),
    }
}

/// Hash of `PERSONAL_MESSAGE_PREFIX || decimal(len) || message`.
pub fn personal_message_hash(message: &[u8]) -> HashVal {
    let mut buf = Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + 8 + message.len());
    buf.extend_from_slice(PERSONAL_MESSAGE_PREFIX.as_bytes());
    buf.extend_from_slice(message.len().to_string().as_bytes());
    buf.extend_from_slice(message);
    keccak256(&buf)
}

/// A secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generates a fresh key from the OS random source.
    pub fn generate() -> Self {
        PrivateKey(SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// From a 32-byte scalar.
    pub fn from_bytes(bts: &[u8]) -> Result<Self, CryptoError> {
        if bts.len() != 32 {
            return Err(CryptoError::InvalidPrivateKey(format!(
                "expected 32 bytes, got {}",
                bts.len()
            )));
        }
        SigningKey::from_slice(bts)
            .map(PrivateKey)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
    }

    /// From 64 hex characters, optionally `0x`-prefixed.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(strip_hex_prefix(s))
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_bytes(&raw)
    }

    /// The 32-byte scalar. Treat the output as secret.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(k256::PublicKey::from(self.0.verifying_key()))
    }

    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Signs a 32-byte digest, producing the wire form with `V` in {27, 28}.
    pub fn sign_digest(&self, digest: &HashVal) -> Result<Signature, CryptoError> {
        let (sig, recid) = self
            .0
            .sign_prehash_recoverable(&digest.0)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        let mut rs = [0u8; 64];
        rs.copy_from_slice(&sig.to_bytes());
        Signature::from_compact(rs, recid.to_byte())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("PrivateKey(<{}>)", self.address()))
    }
}

/// A secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Parses a SEC1-encoded key, compressed or uncompressed.
    pub fn from_sec1_bytes(bts: &[u8]) -> Result<Self, CryptoError> {
        k256::PublicKey::from_sec1_bytes(bts)
            .map(PublicKey)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Parses a PKIX (SubjectPublicKeyInfo) PEM document.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        k256::PublicKey::from_public_key_pem(pem)
            .map(PublicKey)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Encodes the key as a PKIX PEM document.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// 65 bytes, starting with `0x04`.
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out.copy_from_slice(self.0.to_encoded_point(false).as_bytes());
        out
    }

    pub fn address(&self) -> Address {
        let uncompressed = self.to_uncompressed();
        let mut evm = [0u8; EVM_ADDRESS_LEN];
        evm.copy_from_slice(&keccak256(&uncompressed[1..]).0[12..]);
        Address::from_evm(evm)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("PublicKey({})", hex::encode(self.to_uncompressed())))
    }
}

/// A recoverable signature in wire form: `R (32) || S (32) || V (1)` with `V` in {27, 28}.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 65]);

impl Signature {
    /// From `R||S` and an internal recovery id in {0, 1}.
    pub fn from_compact(rs: [u8; 64], recid: u8) -> Result<Self, CryptoError> {
        if recid > 1 {
            return Err(CryptoError::InvalidRecoveryByte(recid));
        }
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&rs);
        out[64] = recid + WIRE_V_OFFSET;
        Ok(Signature(out))
    }

    /// Parses 65 wire bytes. `V` must be 27 or 28.
    pub fn from_wire(bts: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 65] = bts
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bts.len()))?;
        match arr[64].checked_sub(WIRE_V_OFFSET) {
            Some(0) | Some(1) => Ok(Signature(arr)),
            _ => Err(CryptoError::InvalidRecoveryByte(arr[64])),
        }
    }

    /// Parses `0x`-prefixed (or bare) hex of the wire form.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(strip_hex_prefix(s))
            .map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_wire(&raw)
    }

    /// `0x` followed by 130 lowercase hex characters.
    pub fn to_hex_prefixed(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// The internal recovery id, in {0, 1}.
    pub fn recovery_id(&self) -> u8 {
        self.0[64] - WIRE_V_OFFSET
    }

    /// Recovers the signing public key for a digest.
    pub fn recover(&self, digest: &HashVal) -> Result<PublicKey, CryptoError> {
        let sig = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        let recid = RecoveryId::from_byte(self.recovery_id())
            .ok_or(CryptoError::InvalidRecoveryByte(self.0[64]))?;
        let vk = VerifyingKey::recover_from_prehash(&digest.0, &sig, recid)
            .map_err(|_| CryptoError::RecoveryFailed)?;
        Ok(PublicKey(k256::PublicKey::from(&vk)))
    }

    /// DER encoding of `(R, S)`, without the recovery byte.
    pub fn to_der(&self) -> Result<Vec<u8>, CryptoError> {
        let sig = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        Ok(sig.to_der().as_bytes().to_vec())
    }

    /// Recovers the signer address for a digest.
    pub fn recover_address(&self, digest: &HashVal) -> Result<Address, CryptoError> {
        Ok(self.recover(digest)?.address())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("Signature({})", self.to_hex_prefixed()))
    }
}

/// Recovers the 20-byte EVM address that produced a wire signature over `digest`.
pub fn recover(digest: &HashVal, sig_wire: &[u8]) -> Result<[u8; EVM_ADDRESS_LEN], CryptoError> {
    let sig = Signature::from_wire(sig_wire)?;
    Ok(sig.recover_address(digest)?.to_evm_bytes())
}

/// Converts a DER-encoded `(R, S)` signature into the 64-byte compact form.
///
/// `R` and `S` may be shorter (leading zeros stripped) or carry a sign byte; both come out as exactly 32 bytes. High-S values are folded into the lower half of the curve order.
pub fn compact_from_der(der: &[u8]) -> Result<[u8; 64], CryptoError> {
    let sig = EcdsaSignature::from_der(der)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    let sig = sig.normalize_s().unwrap_or(sig);
    let mut rs = [0u8; 64];
    rs.copy_from_slice(&sig.to_bytes());
    Ok(rs)
}

/// Signs a personal message: returns `0x || hex(R||S||V)` with `V` in {27, 28}.
pub fn sign_message_v2(key: &PrivateKey, message: &str) -> Result<String, CryptoError> {
    let digest = personal_message_hash(&message_bytes(message)?);
    Ok(key.sign_digest(&digest)?.to_hex_prefixed())
}

/// Checks that `signature` over the personal message was produced by `address`.
pub fn verify_message_v2(message: &str, signature: &str, address: &Address) -> bool {
    let check = || -> Result<bool, CryptoError> {
        let digest = personal_message_hash(&message_bytes(message)?);
        let sig = Signature::from_hex(signature)?;
        Ok(&sig.recover_address(&digest)? == address)
    };
    check().unwrap_or(false)
}
