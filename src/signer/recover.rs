use troncrypt::{Address, Signature};
use tronstructs::Transaction;

use crate::{Result, SdkError};

/// Recovers the address behind each signature of `tx`, in signature order.
///
/// Signatures of the wrong length or that fail to recover are skipped.
pub fn recover_signers(tx: &Transaction) -> Result<Vec<Address>> {
    if tx.signature.is_empty() {
        return Err(SdkError::State("transaction has no signatures".into()));
    }
    let digest = tx.txid()?;
    let signers = tx
        .signature
        .iter()
        .enumerate()
        .filter_map(|(idx, raw)| {
            match Signature::from_wire(raw).and_then(|sig| sig.recover_address(&digest)) {
                Ok(addr) => Some(addr),
                Err(err) => {
                    log::debug!("skipping signature {} of {}: {}", idx, digest, err);
                    None
                }
            }
        })
        .collect();
    Ok(signers)
}
