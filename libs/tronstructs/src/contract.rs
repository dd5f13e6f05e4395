use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct SmartContract {
    #[prost(bytes = "vec", tag = "1")]
    pub origin_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub contract_address: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub abi: Option<WireAbi>,
    #[prost(bytes = "vec", tag = "4")]
    pub bytecode: Vec<u8>,
    #[prost(int64, tag = "5")]
    pub call_value: i64,
    #[prost(int64, tag = "6")]
    pub consume_user_resource_percent: i64,
    #[prost(string, tag = "7")]
    pub name: String,
    #[prost(int64, tag = "8")]
    pub origin_energy_limit: i64,
    #[prost(bytes = "vec", tag = "9")]
    pub code_hash: Vec<u8>,
    #[prost(bytes = "vec", tag = "10")]
    pub trx_hash: Vec<u8>,
    #[prost(int32, tag = "11")]
    pub version: i32,
}

/// A contract interface as the node stores it.
#[derive(Clone, PartialEq, Message)]
pub struct WireAbi {
    #[prost(message, repeated, tag = "1")]
    pub entrys: Vec<WireAbiEntry>,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireAbiEntry {
    #[prost(bool, tag = "1")]
    pub anonymous: bool,
    #[prost(bool, tag = "2")]
    pub constant: bool,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(message, repeated, tag = "4")]
    pub inputs: Vec<WireAbiParam>,
    #[prost(message, repeated, tag = "5")]
    pub outputs: Vec<WireAbiParam>,
    #[prost(enumeration = "EntryType", tag = "6")]
    pub r#type: i32,
    #[prost(bool, tag = "7")]
    pub payable: bool,
    #[prost(enumeration = "StateMutabilityType", tag = "8")]
    pub state_mutability: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireAbiParam {
    #[prost(bool, tag = "1")]
    pub indexed: bool,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub r#type: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum EntryType {
    UnknownEntryType = 0,
    Constructor = 1,
    Function = 2,
    Event = 3,
    Fallback = 4,
    Receive = 5,
    Error = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum StateMutabilityType {
    UnknownMutabilityType = 0,
    Pure = 1,
    View = 2,
    Nonpayable = 3,
    Payable = 4,
}

#[derive(Clone, PartialEq, Message)]
pub struct ContractState {
    #[prost(int64, tag = "1")]
    pub energy_usage: i64,
    #[prost(int64, tag = "2")]
    pub energy_factor: i64,
    #[prost(int64, tag = "3")]
    pub update_cycle: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct SmartContractDataWrapper {
    #[prost(message, optional, tag = "1")]
    pub smart_contract: Option<SmartContract>,
    #[prost(bytes = "vec", tag = "2")]
    pub runtimecode: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub contract_state: Option<ContractState>,
}

impl From<&WireAbiParam> for tronabi::Param {
    fn from(p: &WireAbiParam) -> Self {
        tronabi::Param {
            name: p.name.clone(),
            ty: p.r#type.clone(),
            indexed: p.indexed,
        }
    }
}

impl From<&WireAbiEntry> for tronabi::Entry {
    fn from(e: &WireAbiEntry) -> Self {
        use tronabi::{EntryKind, Mutability};
        let kind = match EntryType::try_from(e.r#type) {
            Ok(EntryType::Constructor) => EntryKind::Constructor,
            Ok(EntryType::Function) => EntryKind::Function,
            Ok(EntryType::Event) => EntryKind::Event,
            Ok(EntryType::Fallback) => EntryKind::Fallback,
            _ => EntryKind::Unknown,
        };
        let mutability = match StateMutabilityType::try_from(e.state_mutability) {
            Ok(StateMutabilityType::Pure) => Mutability::Pure,
            Ok(StateMutabilityType::View) => Mutability::View,
            Ok(StateMutabilityType::Nonpayable) => Mutability::Nonpayable,
            Ok(StateMutabilityType::Payable) => Mutability::Payable,
            _ => Mutability::Unknown,
        };
        tronabi::Entry {
            kind,
            name: e.name.clone(),
            inputs: e.inputs.iter().map(Into::into).collect(),
            outputs: e.outputs.iter().map(Into::into).collect(),
            payable: e.payable,
            mutability,
            constant: e.constant,
        }
    }
}

impl From<&WireAbi> for tronabi::Abi {
    fn from(abi: &WireAbi) -> Self {
        tronabi::Abi::new(abi.entrys.iter().map(Into::into).collect())
    }
}

impl From<&tronabi::Entry> for WireAbiEntry {
    fn from(e: &tronabi::Entry) -> Self {
        use tronabi::{EntryKind, Mutability};
        let r#type = match e.kind {
            EntryKind::Constructor => EntryType::Constructor,
            EntryKind::Function => EntryType::Function,
            EntryKind::Event => EntryType::Event,
            EntryKind::Fallback => EntryType::Fallback,
            EntryKind::Unknown => EntryType::UnknownEntryType,
        };
        let state_mutability = match e.mutability {
            Mutability::Pure => StateMutabilityType::Pure,
            Mutability::View => StateMutabilityType::View,
            Mutability::Nonpayable => StateMutabilityType::Nonpayable,
            Mutability::Payable => StateMutabilityType::Payable,
            Mutability::Unknown => StateMutabilityType::UnknownMutabilityType,
        };
        let param = |p: &tronabi::Param| WireAbiParam {
            indexed: p.indexed,
            name: p.name.clone(),
            r#type: p.ty.clone(),
        };
        WireAbiEntry {
            anonymous: false,
            constant: e.constant,
            name: e.name.clone(),
            inputs: e.inputs.iter().map(param).collect(),
            outputs: e.outputs.iter().map(param).collect(),
            r#type: r#type as i32,
            payable: e.payable,
            state_mutability: state_mutability as i32,
        }
    }
}

impl From<&tronabi::Abi> for WireAbi {
    fn from(abi: &tronabi::Abi) -> Self {
        WireAbi {
            entrys: abi.entries.iter().map(Into::into).collect(),
        }
    }
}
