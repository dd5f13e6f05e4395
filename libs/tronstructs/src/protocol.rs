use prost::bytes::{Buf, BufMut};
use prost::encoding::{self, DecodeContext, WireType};
use prost::{DecodeError, Message};

use crate::SmartContract;

/// A transaction envelope: the signed payload and its signatures.
///
/// A decoded envelope remembers the exact bytes its `raw_data` arrived in. While the payload is
/// unchanged, those bytes are what gets hashed and re-encoded, so fields this crate does not
/// model, or a field order unlike prost's, cannot change the id.
#[derive(Clone, Debug, Default)]
pub struct Transaction {
    pub raw_data: Option<TransactionRaw>,
    /// 65-byte `R || S || V` signatures, `V` in {27, 28}.
    pub signature: Vec<Vec<u8>>,
    pub ret: Vec<TransactionResult>,
    pub received: ReceivedRaw,
}

/// The wire form of a decoded `raw_data`, with the payload it decoded to.
#[derive(Clone, Default)]
pub struct ReceivedRaw(Option<(TransactionRaw, Vec<u8>)>);

impl ReceivedRaw {
    /// The received bytes, if `raw` is still what they decode to.
    pub fn bytes_for(&self, raw: &TransactionRaw) -> Option<&[u8]> {
        match &self.0 {
            Some((decoded, bytes)) if decoded == raw => Some(bytes),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ReceivedRaw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some((_, bytes)) => write!(f, "ReceivedRaw({} bytes)", bytes.len()),
            None => f.write_str("ReceivedRaw(none)"),
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.raw_data == other.raw_data
            && self.signature == other.signature
            && self.ret == other.ret
    }
}

impl Message for Transaction {
    fn encode_raw<B>(&self, buf: &mut B)
    where
        B: BufMut,
    {
        if let Some(raw) = &self.raw_data {
            match self.received.bytes_for(raw) {
                Some(bytes) => {
                    encoding::encode_key(1, WireType::LengthDelimited, buf);
                    encoding::encode_varint(bytes.len() as u64, buf);
                    buf.put_slice(bytes);
                }
                None => encoding::message::encode(1, raw, buf),
            }
        }
        encoding::bytes::encode_repeated(2, &self.signature, buf);
        encoding::message::encode_repeated(5, &self.ret, buf);
    }

    fn merge_field<B>(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut B,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError>
    where
        B: Buf,
    {
        match tag {
            1 => {
                encoding::check_wire_type(WireType::LengthDelimited, wire_type)?;
                let len = encoding::decode_varint(buf)?;
                if len > buf.remaining() as u64 {
                    return Err(DecodeError::new("buffer underflow"));
                }
                let bytes = buf.copy_to_bytes(len as usize);
                match self.raw_data.as_mut() {
                    // a repeated field 1 merges into the first occurrence
                    Some(raw) => {
                        raw.merge(bytes)?;
                        self.received = ReceivedRaw::default();
                    }
                    None => {
                        let raw = TransactionRaw::decode(bytes.clone())?;
                        self.received = ReceivedRaw(Some((raw.clone(), bytes.to_vec())));
                        self.raw_data = Some(raw);
                    }
                }
                Ok(())
            }
            2 => encoding::bytes::merge_repeated(wire_type, &mut self.signature, buf, ctx),
            5 => encoding::message::merge_repeated(wire_type, &mut self.ret, buf, ctx),
            _ => encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let raw = match &self.raw_data {
            Some(raw) => match self.received.bytes_for(raw) {
                Some(bytes) => {
                    encoding::key_len(1)
                        + encoding::encoded_len_varint(bytes.len() as u64)
                        + bytes.len()
                }
                None => encoding::message::encoded_len(1, raw),
            },
            None => 0,
        };
        raw + encoding::bytes::encoded_len_repeated(2, &self.signature)
            + encoding::message::encoded_len_repeated(5, &self.ret)
    }

    fn clear(&mut self) {
        *self = Transaction::default();
    }
}

/// The signed part of a transaction. Its encoding is what the transaction id hashes.
#[derive(Clone, PartialEq, Message)]
pub struct TransactionRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub ref_block_bytes: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub ref_block_num: i64,
    #[prost(bytes = "vec", tag = "4")]
    pub ref_block_hash: Vec<u8>,
    #[prost(int64, tag = "8")]
    pub expiration: i64,
    #[prost(message, repeated, tag = "9")]
    pub auths: Vec<Authority>,
    #[prost(bytes = "vec", tag = "10")]
    pub data: Vec<u8>,
    #[prost(message, repeated, tag = "11")]
    pub contract: Vec<TransactionContract>,
    #[prost(bytes = "vec", tag = "12")]
    pub scripts: Vec<u8>,
    #[prost(int64, tag = "14")]
    pub timestamp: i64,
    #[prost(int64, tag = "18")]
    pub fee_limit: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct AccountId {
    #[prost(bytes = "vec", tag = "1")]
    pub name: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub address: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Authority {
    #[prost(message, optional, tag = "1")]
    pub account: Option<AccountId>,
    #[prost(bytes = "vec", tag = "2")]
    pub permission_name: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionContract {
    #[prost(enumeration = "ContractType", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub parameter: Option<prost_types::Any>,
    #[prost(bytes = "vec", tag = "3")]
    pub provider: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub contract_name: Vec<u8>,
    #[prost(int32, tag = "5")]
    pub permission_id: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ContractType {
    AccountCreateContract = 0,
    TransferContract = 1,
    TransferAssetContract = 2,
    VoteWitnessContract = 4,
    WitnessCreateContract = 5,
    FreezeBalanceContract = 11,
    UnfreezeBalanceContract = 12,
    WithdrawBalanceContract = 13,
    AccountUpdateContract = 10,
    CreateSmartContract = 30,
    TriggerSmartContract = 31,
    UpdateSettingContract = 33,
    AccountPermissionUpdateContract = 46,
    FreezeBalanceV2Contract = 54,
    UnfreezeBalanceV2Contract = 55,
    WithdrawExpireUnfreezeContract = 56,
    DelegateResourceContract = 57,
    UnDelegateResourceContract = 58,
    CancelAllUnfreezeV2Contract = 59,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionResult {
    #[prost(int64, tag = "1")]
    pub fee: i64,
    #[prost(int32, tag = "2")]
    pub ret: i32,
    #[prost(enumeration = "ContractResult", tag = "3")]
    pub contract_ret: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ContractResult {
    Default = 0,
    Success = 1,
    Revert = 2,
    BadJumpDestination = 3,
    OutOfMemory = 4,
    PrecompiledContract = 5,
    StackTooSmall = 6,
    StackTooLarge = 7,
    IllegalOperation = 8,
    StackOverflow = 9,
    OutOfEnergy = 10,
    OutOfTime = 11,
    JvmStackOverFlow = 12,
    Unknown = 13,
    TransferFailed = 14,
    InvalidCode = 15,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResourceCode {
    Bandwidth = 0,
    Energy = 1,
    TronPower = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum AccountType {
    Normal = 0,
    AssetIssue = 1,
    Contract = 2,
}

/// A contract payload that can ride in a transaction's `parameter` field.
pub trait ContractPayload: Message + Default {
    const TYPE: ContractType;
    /// Unqualified message name; the `Any` type URL is derived from it.
    const NAME: &'static str;

    fn type_url() -> String {
        format!("type.googleapis.com/protocol.{}", Self::NAME)
    }
}

macro_rules! payload {
    ($name:ident, $($field:tt)*) => {
        #[derive(Clone, PartialEq, Message)]
        pub struct $name {
            $($field)*
        }

        impl ContractPayload for $name {
            const TYPE: ContractType = ContractType::$name;
            const NAME: &'static str = stringify!($name);
        }
    };
}

payload!(TransferContract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub to_address: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub amount: i64,
);

payload!(AccountCreateContract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub account_address: Vec<u8>,
    #[prost(enumeration = "AccountType", tag = "3")]
    pub r#type: i32,
);

payload!(FreezeBalanceV2Contract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub frozen_balance: i64,
    #[prost(enumeration = "ResourceCode", tag = "3")]
    pub resource: i32,
);

payload!(UnfreezeBalanceV2Contract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub unfreeze_balance: i64,
    #[prost(enumeration = "ResourceCode", tag = "3")]
    pub resource: i32,
);

payload!(WithdrawExpireUnfreezeContract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
);

payload!(DelegateResourceContract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(enumeration = "ResourceCode", tag = "2")]
    pub resource: i32,
    #[prost(int64, tag = "3")]
    pub balance: i64,
    #[prost(bytes = "vec", tag = "4")]
    pub receiver_address: Vec<u8>,
    #[prost(bool, tag = "5")]
    pub lock: bool,
    #[prost(int64, tag = "6")]
    pub lock_period: i64,
);

payload!(UnDelegateResourceContract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(enumeration = "ResourceCode", tag = "2")]
    pub resource: i32,
    #[prost(int64, tag = "3")]
    pub balance: i64,
    #[prost(bytes = "vec", tag = "4")]
    pub receiver_address: Vec<u8>,
);

payload!(TriggerSmartContract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub contract_address: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub call_value: i64,
    #[prost(bytes = "vec", tag = "4")]
    pub data: Vec<u8>,
    #[prost(int64, tag = "5")]
    pub call_token_value: i64,
    #[prost(int64, tag = "6")]
    pub token_id: i64,
);

payload!(CreateSmartContract,
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub new_contract: Option<SmartContract>,
    #[prost(int64, tag = "3")]
    pub call_token_value: i64,
    #[prost(int64, tag = "4")]
    pub token_id: i64,
);

#[derive(Clone, PartialEq, Message)]
pub struct BlockHeaderRaw {
    #[prost(int64, tag = "1")]
    pub timestamp: i64,
    #[prost(bytes = "vec", tag = "2")]
    pub tx_trie_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub parent_hash: Vec<u8>,
    #[prost(int64, tag = "7")]
    pub number: i64,
    #[prost(int64, tag = "8")]
    pub witness_id: i64,
    #[prost(bytes = "vec", tag = "9")]
    pub witness_address: Vec<u8>,
    #[prost(int32, tag = "10")]
    pub version: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct BlockHeader {
    #[prost(message, optional, tag = "1")]
    pub raw_data: Option<BlockHeaderRaw>,
    #[prost(bytes = "vec", tag = "2")]
    pub witness_signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Block {
    #[prost(message, repeated, tag = "1")]
    pub transactions: Vec<Transaction>,
    #[prost(message, optional, tag = "2")]
    pub block_header: Option<BlockHeader>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Key {
    #[prost(bytes = "vec", tag = "1")]
    pub address: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub weight: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Permission {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(int32, tag = "2")]
    pub id: i32,
    #[prost(string, tag = "3")]
    pub permission_name: String,
    #[prost(int64, tag = "4")]
    pub threshold: i64,
    #[prost(int32, tag = "5")]
    pub parent_id: i32,
    #[prost(bytes = "vec", tag = "6")]
    pub operations: Vec<u8>,
    #[prost(message, repeated, tag = "7")]
    pub keys: Vec<Key>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FreezeV2 {
    #[prost(enumeration = "ResourceCode", tag = "1")]
    pub r#type: i32,
    #[prost(int64, tag = "2")]
    pub amount: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct UnFreezeV2 {
    #[prost(enumeration = "ResourceCode", tag = "1")]
    pub r#type: i32,
    #[prost(int64, tag = "3")]
    pub unfreeze_amount: i64,
    #[prost(int64, tag = "4")]
    pub unfreeze_expire_time: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Account {
    #[prost(bytes = "vec", tag = "1")]
    pub account_name: Vec<u8>,
    #[prost(enumeration = "AccountType", tag = "2")]
    pub r#type: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub address: Vec<u8>,
    #[prost(int64, tag = "4")]
    pub balance: i64,
    #[prost(int64, tag = "8")]
    pub net_usage: i64,
    #[prost(int64, tag = "9")]
    pub create_time: i64,
    #[prost(int64, tag = "10")]
    pub latest_opration_time: i64,
    #[prost(int64, tag = "19")]
    pub free_net_usage: i64,
    #[prost(message, optional, tag = "31")]
    pub owner_permission: Option<Permission>,
    #[prost(message, repeated, tag = "33")]
    pub active_permission: Vec<Permission>,
    #[prost(message, repeated, tag = "34")]
    pub frozen_v2: Vec<FreezeV2>,
    #[prost(message, repeated, tag = "35")]
    pub unfrozen_v2: Vec<UnFreezeV2>,
    #[prost(int64, tag = "36")]
    pub delegated_frozen_v2_balance_for_bandwidth: i64,
    #[prost(int64, tag = "37")]
    pub acquired_delegated_frozen_v2_balance_for_bandwidth: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Log {
    #[prost(bytes = "vec", tag = "1")]
    pub address: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub topics: Vec<Vec<u8>>,
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ResourceReceipt {
    #[prost(int64, tag = "1")]
    pub energy_usage: i64,
    #[prost(int64, tag = "2")]
    pub energy_fee: i64,
    #[prost(int64, tag = "3")]
    pub origin_energy_usage: i64,
    #[prost(int64, tag = "4")]
    pub energy_usage_total: i64,
    #[prost(int64, tag = "5")]
    pub net_usage: i64,
    #[prost(int64, tag = "6")]
    pub net_fee: i64,
    #[prost(enumeration = "ContractResult", tag = "7")]
    pub result: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionInfo {
    #[prost(bytes = "vec", tag = "1")]
    pub id: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub fee: i64,
    #[prost(int64, tag = "3")]
    pub block_number: i64,
    #[prost(int64, tag = "4")]
    pub block_time_stamp: i64,
    #[prost(bytes = "vec", repeated, tag = "5")]
    pub contract_result: Vec<Vec<u8>>,
    #[prost(bytes = "vec", tag = "6")]
    pub contract_address: Vec<u8>,
    #[prost(message, optional, tag = "7")]
    pub receipt: Option<ResourceReceipt>,
    #[prost(message, repeated, tag = "8")]
    pub log: Vec<Log>,
    /// 0 on success, 1 on failure.
    #[prost(int32, tag = "9")]
    pub result: i32,
    #[prost(bytes = "vec", tag = "10")]
    pub res_message: Vec<u8>,
}

impl TransactionInfo {
    /// Whether the node has recorded the transaction in a block.
    pub fn is_confirmed(&self) -> bool {
        !self.id.is_empty() && self.block_number > 0
    }
}
