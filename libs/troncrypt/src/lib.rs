//! Cryptographic primitives and the account address codec used across the SDK.
//!
//! - `HashVal` plus `keccak256`/`sha256` and base58 helpers wrap the hash and encoding primitives.
//! - `Address` is the 21-byte account identifier with its base58-check, hex, and 20-byte EVM forms.
//! - `PrivateKey`, `PublicKey`, and `Signature` wrap secp256k1 signing and recovery in the chain's 65-byte `R||S||V` form.

mod address;
mod hash;
mod keys;

pub use address::*;
pub use hash::*;
pub use keys::*;
