use std::collections::HashMap;

use prost::Message;

use crate::{BlockHeader, Log, Transaction};

#[derive(Clone, PartialEq, Message)]
pub struct EmptyMessage {}

#[derive(Clone, PartialEq, Message)]
pub struct BytesMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct NumberMessage {
    #[prost(int64, tag = "1")]
    pub num: i64,
}

/// Block range `[start_num, end_num)`.
#[derive(Clone, PartialEq, Message)]
pub struct BlockLimit {
    #[prost(int64, tag = "1")]
    pub start_num: i64,
    #[prost(int64, tag = "2")]
    pub end_num: i64,
}

/// The uniform "did it work" envelope of transaction-building and broadcast calls.
#[derive(Clone, PartialEq, Message)]
pub struct Return {
    #[prost(bool, tag = "1")]
    pub result: bool,
    #[prost(enumeration = "ResponseCode", tag = "2")]
    pub code: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub message: Vec<u8>,
}

impl Return {
    pub fn message_text(&self) -> String {
        String::from_utf8_lossy(&self.message).into_owned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResponseCode {
    Success = 0,
    Sigerror = 1,
    ContractValidateError = 2,
    ContractExeError = 3,
    BandwithError = 4,
    DupTransactionError = 5,
    TaposError = 6,
    TooBigTransactionError = 7,
    TransactionExpirationError = 8,
    ServerBusy = 9,
    NoConnection = 10,
    NotEnoughEffectiveConnection = 11,
    OtherError = 20,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionExtention {
    #[prost(message, optional, tag = "1")]
    pub transaction: Option<Transaction>,
    #[prost(bytes = "vec", tag = "2")]
    pub txid: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub constant_result: Vec<Vec<u8>>,
    #[prost(message, optional, tag = "4")]
    pub result: Option<Return>,
    #[prost(int64, tag = "5")]
    pub energy_used: i64,
    #[prost(message, repeated, tag = "6")]
    pub logs: Vec<Log>,
    #[prost(int64, tag = "8")]
    pub energy_penalty: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct BlockExtention {
    #[prost(message, repeated, tag = "1")]
    pub transactions: Vec<TransactionExtention>,
    #[prost(message, optional, tag = "2")]
    pub block_header: Option<BlockHeader>,
    #[prost(bytes = "vec", tag = "3")]
    pub blockid: Vec<u8>,
}

impl BlockExtention {
    /// The block height, or 0 when the header is absent.
    pub fn number(&self) -> i64 {
        self.block_header
            .as_ref()
            .and_then(|h| h.raw_data.as_ref())
            .map(|raw| raw.number)
            .unwrap_or_default()
    }

    /// The node answers a missing block with an empty message.
    pub fn is_empty(&self) -> bool {
        self.blockid.is_empty() && self.block_header.is_none()
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct BlockListExtention {
    #[prost(message, repeated, tag = "1")]
    pub block: Vec<BlockExtention>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AccountResourceMessage {
    #[prost(int64, tag = "1")]
    pub free_net_used: i64,
    #[prost(int64, tag = "2")]
    pub free_net_limit: i64,
    #[prost(int64, tag = "3")]
    pub net_used: i64,
    #[prost(int64, tag = "4")]
    pub net_limit: i64,
    #[prost(int64, tag = "7")]
    pub total_net_limit: i64,
    #[prost(int64, tag = "8")]
    pub total_net_weight: i64,
    #[prost(int64, tag = "9")]
    pub total_tron_power_weight: i64,
    #[prost(int64, tag = "10")]
    pub tron_power_used: i64,
    #[prost(int64, tag = "11")]
    pub tron_power_limit: i64,
    #[prost(int64, tag = "13")]
    pub energy_used: i64,
    #[prost(int64, tag = "14")]
    pub energy_limit: i64,
    #[prost(int64, tag = "15")]
    pub total_energy_limit: i64,
    #[prost(int64, tag = "16")]
    pub total_energy_weight: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct AccountNetMessage {
    #[prost(int64, tag = "1")]
    pub free_net_used: i64,
    #[prost(int64, tag = "2")]
    pub free_net_limit: i64,
    #[prost(int64, tag = "3")]
    pub net_used: i64,
    #[prost(int64, tag = "4")]
    pub net_limit: i64,
    #[prost(map = "string, int64", tag = "5")]
    pub asset_net_used: HashMap<String, i64>,
    #[prost(map = "string, int64", tag = "6")]
    pub asset_net_limit: HashMap<String, i64>,
    #[prost(int64, tag = "7")]
    pub total_net_limit: i64,
    #[prost(int64, tag = "8")]
    pub total_net_weight: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChainParameter {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(int64, tag = "2")]
    pub value: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChainParameters {
    #[prost(message, repeated, tag = "1")]
    pub chain_parameter: Vec<ChainParameter>,
}

impl ChainParameters {
    pub fn get(&self, key: &str) -> Option<i64> {
        self.chain_parameter
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value)
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct NodeAddress {
    #[prost(bytes = "vec", tag = "1")]
    pub host: Vec<u8>,
    #[prost(int32, tag = "2")]
    pub port: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Node {
    #[prost(message, optional, tag = "1")]
    pub address: Option<NodeAddress>,
}

#[derive(Clone, PartialEq, Message)]
pub struct NodeList {
    #[prost(message, repeated, tag = "1")]
    pub nodes: Vec<Node>,
}

#[derive(Clone, PartialEq, Message)]
pub struct NodeInfo {
    #[prost(int64, tag = "1")]
    pub begin_sync_num: i64,
    #[prost(string, tag = "2")]
    pub block: String,
    #[prost(string, tag = "3")]
    pub solidity_block: String,
    #[prost(int32, tag = "4")]
    pub current_connect_count: i32,
    #[prost(int32, tag = "5")]
    pub active_connect_count: i32,
    #[prost(int32, tag = "6")]
    pub passive_connect_count: i32,
    #[prost(int64, tag = "7")]
    pub total_flow: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct DelegatedResourceMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub from_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub to_address: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DelegatedResource {
    #[prost(bytes = "vec", tag = "1")]
    pub from: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub to: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub frozen_balance_for_bandwidth: i64,
    #[prost(int64, tag = "4")]
    pub frozen_balance_for_energy: i64,
    #[prost(int64, tag = "5")]
    pub expire_time_for_bandwidth: i64,
    #[prost(int64, tag = "6")]
    pub expire_time_for_energy: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct DelegatedResourceList {
    #[prost(message, repeated, tag = "1")]
    pub delegated_resource: Vec<DelegatedResource>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DelegatedResourceAccountIndex {
    #[prost(bytes = "vec", tag = "1")]
    pub account: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub from_accounts: Vec<Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub to_accounts: Vec<Vec<u8>>,
    #[prost(int64, tag = "4")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct CanDelegatedMaxSizeRequestMessage {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub owner_address: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CanDelegatedMaxSizeResponseMessage {
    #[prost(int64, tag = "1")]
    pub max_size: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetAvailableUnfreezeCountRequestMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetAvailableUnfreezeCountResponseMessage {
    #[prost(int64, tag = "1")]
    pub count: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct CanWithdrawUnfreezeAmountRequestMessage {
    #[prost(bytes = "vec", tag = "1")]
    pub owner_address: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct CanWithdrawUnfreezeAmountResponseMessage {
    #[prost(int64, tag = "1")]
    pub amount: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct EstimateEnergyMessage {
    #[prost(message, optional, tag = "1")]
    pub result: Option<Return>,
    #[prost(int64, tag = "2")]
    pub energy_required: i64,
}
