//! Transaction and message signing, with keys held locally or in a remote key management service.

use async_trait::async_trait;
use troncrypt::{Address, Signature};
use tronnet::Context;
use tronstructs::Transaction;

use crate::Result;

mod kms;
mod local;
mod recover;

pub use kms::*;
pub use local::*;
pub use recover::*;

/// Signs transactions and personal messages on behalf of one address.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    /// Signs the transaction id and appends the signature, leaving earlier signatures in place.
    async fn sign_tx(&self, ctx: &Context, tx: &mut Transaction) -> Result<()>;

    /// Signs a personal message, returning `0x`-prefixed hex of the 65-byte signature.
    async fn sign_message_v2(&self, ctx: &Context, message: &str) -> Result<String>;

    /// Switches every contract of the transaction to `permission_id`, then signs. Any signatures
    /// made under the previous permission are discarded.
    async fn sign_tx_with_permission(
        &self,
        ctx: &Context,
        tx: &mut Transaction,
        permission_id: i32,
    ) -> Result<()> {
        tx.set_permission_id(permission_id)?;
        self.sign_tx(ctx, tx).await
    }
}

pub(crate) fn append_signature(tx: &mut Transaction, sig: &Signature) {
    tx.signature.push(sig.to_vec());
}
