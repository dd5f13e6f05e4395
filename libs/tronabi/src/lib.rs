//! Contract interface (ABI) processing: the interface model and its JSON parser, the 32-byte-word
//! value codec, method call encoding and result decoding, and event-log decoding.
//!
//! Roughly:
//! - `Abi`/`Entry`/`Param` model a parsed interface description (`Abi::from_json`).
//! - `ParamType` is a parsed type string; `Value` is a typed value.
//! - `encode`/`decode` implement the head-tail layout; `encode_method`, `decode_input` and `decode_result` sit on top.
//! - `ContractProcessor` owns an `Abi` and caches its event topics for log decoding.

mod call;
mod codec;
mod event;
mod json_params;
mod model;
mod parser;
mod processor;
mod trc20;
mod types;
mod value;

pub use call::*;
pub use codec::*;
pub use event::*;
pub use json_params::*;
pub use model::*;
pub use processor::*;
pub use trc20::*;
pub use types::*;
pub use value::*;

pub use ethnum::{I256, U256};

use thiserror::Error;
use troncrypt::AddressError;

pub type Result<T> = std::result::Result<T, AbiError>;

/// Errors raised while parsing interfaces or encoding and decoding values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("malformed ABI JSON: {0}")]
    InvalidJson(String),
    #[error("unsupported type `{0}`")]
    UnknownType(String),
    #[error("cannot use {value} as `{ty}`")]
    TypeMismatch { ty: String, value: String },
    #[error("value {value} out of range for `{ty}`")]
    OutOfRange { ty: String, value: String },
    #[error("`{ty}` expects {expected} bytes, got {got}")]
    WrongLength {
        ty: String,
        expected: usize,
        got: usize,
    },
    #[error("expected {expected} values, got {got}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("method `{0}` not found in ABI")]
    MethodNotFound(String),
    #[error("data too short: {0}")]
    Truncated(String),
    #[error("offset {0} out of range")]
    OffsetOutOfRange(usize),
    #[error("invalid utf-8 in string")]
    InvalidUtf8,
    #[error("event log has no topics")]
    NoTopics,
    #[error("invalid topic length ({0})")]
    InvalidTopic(usize),
    #[error("address: {0}")]
    Address(#[from] AddressError),
}
