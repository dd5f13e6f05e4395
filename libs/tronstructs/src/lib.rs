//! Wire messages of the node's RPC interface, and the transaction lifecycle built on them:
//! transaction ids, signable-field mutators, and offline assembly.
//!
//! The messages are protobuf-compatible and carry the field tags the node uses, so a transaction
//! encoded here hashes to the same id the node computes. Only the fields the SDK reads or writes
//! are declared; unknown fields on decode are skipped.

mod api;
mod contract;
mod protocol;
mod transaction;

pub use api::*;
pub use contract::*;
pub use protocol::*;
pub use transaction::*;

pub use prost::Message;
pub use prost_types::Any;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TxError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("transaction has no raw_data")]
    MissingRawData,
    #[error("transaction has no contract")]
    NoContract,
    #[error("contract index {0} out of range")]
    ContractIndex(usize),
    #[error("expiration {expiration} must be after timestamp {timestamp}")]
    Expiration { timestamp: i64, expiration: i64 },
    #[error("expected a {expected} parameter, found `{found}`")]
    ParameterType { expected: &'static str, found: String },
    #[error("cannot decode {0}")]
    Decode(String),
}
