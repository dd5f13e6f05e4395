//! Connection management for the node's RPC interface: endpoint validation, call contexts with
//! deadlines and cancellation, and a bounded pool of channels.
//!
//! Channels come from a caller-supplied [`Dialer`]. The `testing` feature adds an in-memory
//! service and a loopback TCP transport for exercising code built on the pool.

mod common;
mod context;
mod endpoint;
#[cfg(any(test, feature = "testing"))]
mod framed;
mod pool;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use common::*;
pub use context::*;
pub use endpoint::*;
#[cfg(any(test, feature = "testing"))]
pub use framed::*;
pub use pool::*;
