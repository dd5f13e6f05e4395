use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::Endpoint;

pub type Result<T> = std::result::Result<T, NetError>;

/// Status codes a remote call can fail with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Unknown,
    InvalidArgument,
    NotFound,
    Unimplemented,
    Unavailable,
    Internal,
}

#[derive(Error, Debug)]
pub enum NetError {
    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("canceled")]
    Canceled,
    #[error("dial timed out")]
    DialTimeout,
    #[error("connection pool closed")]
    PoolClosed,
    #[error("channel closed")]
    ChannelClosed,
    #[error("remote error ({code:?}): {message}")]
    Status { code: StatusCode, message: String },
    #[error("bad frame: {0}")]
    Codec(String),
    #[error("network error: `{0}`")]
    Network(std::io::Error),
}

impl NetError {
    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        NetError::Status {
            code,
            message: message.into(),
        }
    }
}

/// Health of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Ready,
    TransientFailure,
    Shutdown,
}

/// A long-lived connection that carries unary calls.
#[async_trait]
pub trait Channel: Send + Sync + 'static {
    fn state(&self) -> ChannelState;

    /// Invokes `method` (a path such as `/protocol.Wallet/GetAccount`) with an encoded request.
    async fn unary(&self, method: &str, request: Vec<u8>) -> Result<Vec<u8>>;
}

/// Opens channels to an endpoint.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, endpoint: &Endpoint) -> Result<Arc<dyn Channel>>;
}
