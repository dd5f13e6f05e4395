use async_trait::async_trait;
use troncrypt::{Address, PrivateKey};
use tronnet::Context;
use tronstructs::Transaction;

use crate::signer::{append_signature, Signer};
use crate::Result;

/// A signer holding its private key in memory.
#[derive(Clone)]
pub struct LocalSigner {
    key: PrivateKey,
    address: Address,
}

impl LocalSigner {
    pub fn new(key: PrivateKey) -> Self {
        let address = key.address();
        LocalSigner { key, address }
    }

    /// From 64 hex characters, optionally `0x`-prefixed.
    pub fn from_hex(key: &str) -> Result<Self> {
        Ok(Self::new(PrivateKey::from_hex(key)?))
    }

    pub fn generate() -> Self {
        Self::new(PrivateKey::generate())
    }

    /// Signs without suspending; see [`Signer::sign_tx`].
    pub fn sign(&self, tx: &mut Transaction) -> Result<()> {
        tx.ensure_signable()?;
        let digest = tx.txid()?;
        let sig = self.key.sign_digest(&digest)?;
        append_signature(tx, &sig);
        Ok(())
    }

    /// Signs a personal message; see [`Signer::sign_message_v2`].
    pub fn sign_message(&self, message: &str) -> Result<String> {
        Ok(troncrypt::sign_message_v2(&self.key, message)?)
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish()
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn address(&self) -> Address {
        self.address.clone()
    }

    async fn sign_tx(&self, ctx: &Context, tx: &mut Transaction) -> Result<()> {
        ctx.check()?;
        self.sign(tx)
    }

    async fn sign_message_v2(&self, ctx: &Context, message: &str) -> Result<String> {
        ctx.check()?;
        self.sign_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recover_signers;
    use quickcheck_macros::quickcheck;
    use troncrypt::verify_message_v2;
    use tronstructs::{BlockRef, TransactionContract, TransferContract};

    fn transfer_tx(from: &Address, amount: i64) -> Transaction {
        let payload = TransferContract {
            owner_address: from.as_bytes().to_vec(),
            to_address: Address::from_evm([7u8; 20]).as_bytes().to_vec(),
            amount,
        };
        let block = BlockRef {
            number: 1000,
            hash: troncrypt::sha256(b"block"),
        };
        Transaction::assemble(TransactionContract::new(&payload), &block, 1_700_000_000_000)
    }

    #[test]
    fn sign_appends_in_order() {
        let a = LocalSigner::generate();
        let b = LocalSigner::generate();
        let mut tx = transfer_tx(&a.address(), 5);
        a.sign(&mut tx).unwrap();
        b.sign(&mut tx).unwrap();
        assert_eq!(tx.signature.len(), 2);
        assert!(tx.signature.iter().all(|s| s.len() == 65 && (s[64] == 27 || s[64] == 28)));
        assert_eq!(recover_signers(&tx).unwrap(), vec![a.address(), b.address()]);
    }

    #[test]
    fn permission_signing_resets_signatures() {
        let signer = LocalSigner::generate();
        let mut tx = transfer_tx(&signer.address(), 5);
        let ctx = Context::background();
        smol::block_on(signer.sign_tx(&ctx, &mut tx)).unwrap();
        let before = tx.txid().unwrap();
        smol::block_on(signer.sign_tx_with_permission(&ctx, &mut tx, 2)).unwrap();
        assert_eq!(tx.signature.len(), 1);
        assert_ne!(tx.txid().unwrap(), before);
        assert_eq!(tx.raw().unwrap().contract[0].permission_id, 2);
        assert_eq!(recover_signers(&tx).unwrap(), vec![signer.address()]);
    }

    #[test]
    fn unsignable_rejected() {
        let signer = LocalSigner::generate();
        let mut tx = Transaction::default();
        assert!(signer.sign(&mut tx).is_err());
        assert!(tx.signature.is_empty());
    }

    #[test]
    fn canceled_context_signs_nothing() {
        let signer = LocalSigner::generate();
        let mut tx = transfer_tx(&signer.address(), 5);
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        assert!(smol::block_on(signer.sign_tx(&ctx, &mut tx)).is_err());
        assert!(tx.signature.is_empty());
    }

    #[test]
    fn message_signatures_verify() {
        let signer = LocalSigner::generate();
        let other = LocalSigner::generate();
        let sig = signer.sign_message("sign message testing").unwrap();
        assert_eq!(sig.len(), 132);
        assert!(verify_message_v2("sign message testing", &sig, &signer.address()));
        assert!(!verify_message_v2("sign message testing", &sig, &other.address()));
    }

    #[quickcheck]
    fn signer_is_recovered(seed: u64, amount: u32) -> bool {
        let mut scalar = [0u8; 32];
        scalar[24..].copy_from_slice(&seed.max(1).to_be_bytes());
        let signer = LocalSigner::new(PrivateKey::from_bytes(&scalar).unwrap());
        let mut tx = transfer_tx(&signer.address(), amount as i64 + 1);
        signer.sign(&mut tx).unwrap();
        recover_signers(&tx).unwrap().contains(&signer.address())
    }
}
