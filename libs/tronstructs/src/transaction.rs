use prost::Message;
use troncrypt::HashVal;

use crate::{
    BlockExtention, ContractPayload, ContractType, Result, Transaction, TransactionContract,
    TransactionRaw, TxError,
};

/// Default lifetime of an assembled transaction.
pub const DEFAULT_EXPIRATION_MS: i64 = 60_000;

/// The reference block a transaction is anchored to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRef {
    pub number: i64,
    pub hash: HashVal,
}

impl BlockRef {
    /// Extracts the reference from a block answer; `None` when the block id is malformed.
    pub fn from_block(block: &BlockExtention) -> Option<Self> {
        Some(BlockRef {
            number: block.number(),
            hash: HashVal::from_slice(&block.blockid)?,
        })
    }
}

impl TransactionContract {
    /// Wraps a payload into a contract entry under the default permission.
    pub fn new<T: ContractPayload>(payload: &T) -> Self {
        TransactionContract {
            r#type: T::TYPE as i32,
            parameter: Some(prost_types::Any {
                type_url: T::type_url(),
                value: payload.encode_to_vec(),
            }),
            ..Default::default()
        }
    }

    /// Decodes the payload, checking that it is of type `T`.
    pub fn payload<T: ContractPayload>(&self) -> Result<T> {
        let any = self.parameter.as_ref().ok_or(TxError::ParameterType {
            expected: T::NAME,
            found: String::new(),
        })?;
        if any.type_url != T::type_url() {
            return Err(TxError::ParameterType {
                expected: T::NAME,
                found: any.type_url.clone(),
            });
        }
        T::decode(any.value.as_slice()).map_err(|e| TxError::Decode(e.to_string()))
    }
}

impl Transaction {
    /// Builds an unsigned transaction around one contract, anchored to `block`, stamped `now_ms`
    /// and expiring a minute later.
    pub fn assemble(contract: TransactionContract, block: &BlockRef, now_ms: i64) -> Self {
        let number = block.number.to_be_bytes();
        Transaction {
            raw_data: Some(TransactionRaw {
                ref_block_bytes: number[6..8].to_vec(),
                ref_block_hash: block.hash[8..16].to_vec(),
                expiration: now_ms + DEFAULT_EXPIRATION_MS,
                timestamp: now_ms,
                contract: vec![contract],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn raw(&self) -> Result<&TransactionRaw> {
        self.raw_data.as_ref().ok_or(TxError::MissingRawData)
    }

    /// Mutable access to the signed payload. Every existing signature is dropped, since none of
    /// them can survive a change.
    fn raw_mut(&mut self) -> Result<&mut TransactionRaw> {
        let raw = self.raw_data.as_mut().ok_or(TxError::MissingRawData)?;
        self.signature.clear();
        Ok(raw)
    }

    /// The encoded `raw_data`: the bytes it was decoded from while unchanged, else its encoding.
    pub fn raw_bytes(&self) -> Result<Vec<u8>> {
        let raw = self.raw()?;
        Ok(match self.received.bytes_for(raw) {
            Some(bytes) => bytes.to_vec(),
            None => raw.encode_to_vec(),
        })
    }

    /// The transaction id: SHA-256 of [`Transaction::raw_bytes`].
    pub fn txid(&self) -> Result<HashVal> {
        Ok(troncrypt::sha256(&self.raw_bytes()?))
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    pub fn contract_type(&self) -> Option<ContractType> {
        let contract = self.raw_data.as_ref()?.contract.first()?;
        ContractType::try_from(contract.r#type).ok()
    }

    /// Checks that the transaction can be signed: it has a payload with at least one contract and
    /// a consistent validity window.
    pub fn ensure_signable(&self) -> Result<()> {
        let raw = self.raw()?;
        if raw.contract.is_empty() {
            return Err(TxError::NoContract);
        }
        if raw.timestamp != 0 && raw.expiration <= raw.timestamp {
            return Err(TxError::Expiration {
                timestamp: raw.timestamp,
                expiration: raw.expiration,
            });
        }
        Ok(())
    }

    /// Selects the permission under which every contract executes.
    pub fn set_permission_id(&mut self, permission_id: i32) -> Result<()> {
        if self.raw()?.contract.is_empty() {
            return Err(TxError::NoContract);
        }
        for contract in self.raw_mut()?.contract.iter_mut() {
            contract.permission_id = permission_id;
        }
        Ok(())
    }

    pub fn set_fee_limit(&mut self, fee_limit: i64) -> Result<()> {
        self.raw_mut()?.fee_limit = fee_limit;
        Ok(())
    }

    /// Sets the timestamp; it must lie before the expiration.
    pub fn set_timestamp(&mut self, timestamp: i64) -> Result<()> {
        let expiration = self.raw()?.expiration;
        if timestamp >= expiration {
            return Err(TxError::Expiration {
                timestamp,
                expiration,
            });
        }
        self.raw_mut()?.timestamp = timestamp;
        Ok(())
    }

    /// Sets the expiration; it must lie after the timestamp.
    pub fn set_expiration(&mut self, expiration: i64) -> Result<()> {
        let timestamp = self.raw()?.timestamp;
        if expiration <= timestamp {
            return Err(TxError::Expiration {
                timestamp,
                expiration,
            });
        }
        self.raw_mut()?.expiration = expiration;
        Ok(())
    }

    /// Replaces the encoded payload of contract `index`, keeping its type URL.
    pub fn set_contract_parameter(&mut self, index: usize, value: Vec<u8>) -> Result<()> {
        if index >= self.raw()?.contract.len() {
            return Err(TxError::ContractIndex(index));
        }
        let contract = &mut self.raw_mut()?.contract[index];
        match contract.parameter.as_mut() {
            Some(any) => any.value = value,
            None => {
                contract.parameter = Some(prost_types::Any {
                    type_url: String::new(),
                    value,
                })
            }
        }
        Ok(())
    }
}
