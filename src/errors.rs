use thiserror::Error;
use troncrypt::{AddressError, CryptoError};
use tronabi::AbiError;
use tronnet::NetError;
use tronstructs::TxError;

pub type Result<T> = std::result::Result<T, SdkError>;

/// Every failure the SDK reports. Remote failures name the operation that hit them.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
    #[error("abi error: {0}")]
    Abi(#[from] AbiError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("transaction error: {0}")]
    Transaction(#[from] TxError),
    #[error("{op} failed: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: NetError,
    },
    #[error("{op} rejected by node: {message}")]
    Rejected { op: &'static str, message: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("kms error: {0}")]
    Kms(String),
}

impl SdkError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        SdkError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn transport(op: &'static str, source: NetError) -> Self {
        SdkError::Transport { op, source }
    }

    /// Whether the call was abandoned because its context was canceled.
    pub fn is_canceled(&self) -> bool {
        matches!(
            self,
            SdkError::Transport {
                source: NetError::Canceled,
                ..
            }
        )
    }

    /// Whether the call was abandoned at its context's deadline.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(
            self,
            SdkError::Transport {
                source: NetError::DeadlineExceeded,
                ..
            }
        )
    }
}

// Raised by context waits outside any one RPC, such as retry backoff.
impl From<NetError> for SdkError {
    fn from(source: NetError) -> Self {
        SdkError::Transport { op: "wait", source }
    }
}
