//! A client SDK for TRON-style chains.
//!
//! A [`Client`] holds a bounded pool of channels to one node. Calls are grouped into managers
//! handed out by the client:
//!
//! - [`AccountManager`] reads accounts and builds transfers.
//! - [`NetworkManager`] reads blocks, transactions, and node state, and broadcasts transactions.
//! - [`ResourceManager`] covers staking, delegation, and unfreezing.
//! - [`ContractManager`] triggers, estimates, and deploys smart contracts.
//!
//! Transactions come back unsigned; a [`Signer`] signs them before broadcast. Every call takes a
//! [`Context`] carrying its deadline and cancellation.

mod account;
mod autoretry;
mod client;
pub mod common;
mod config;
mod contract;
mod errors;
mod network;
mod resources;
mod signer;
mod stub;
mod token;

pub use account::*;
pub use autoretry::autoretry;
pub use client::Client;
pub use config::*;
pub use contract::*;
pub use errors::*;
pub use network::*;
pub use resources::*;
pub use signer::*;
pub use stub::*;
pub use token::*;

pub use tronnet::Context;
pub use {tronabi, troncrypt, tronnet, tronstructs};
