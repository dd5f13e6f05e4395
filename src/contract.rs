use std::sync::Arc;

use troncrypt::Address;
use tronabi::{
    decode, selector_of, Abi, CallResult, ContractProcessor, DecodedEvent, DecodedInput, ParamType,
    Value,
};
use tronnet::Context;
use tronstructs::{
    BytesMessage, ContractResult, CreateSmartContract, Log, SmartContract,
    SmartContractDataWrapper, TransactionExtention, TriggerSmartContract, WireAbi,
};

use crate::client::{check_extention, check_return};
use crate::common::{check_non_empty, check_positive};
use crate::{Client, Result, SdkError};

/// Triggering, deploying, and inspecting smart contracts.
pub struct ContractManager<'a> {
    client: &'a Client,
}

/// Parameters of a contract deployment.
#[derive(Clone, Debug)]
pub struct DeployRequest {
    pub owner: Address,
    pub name: String,
    pub abi: Abi,
    pub bytecode: Vec<u8>,
    pub constructor_args: Vec<Value>,
    pub call_value: i64,
    /// Share of each call's energy the caller pays, in percent.
    pub consume_user_resource_percent: i64,
    /// Most energy the deployer pays for one call.
    pub origin_energy_limit: i64,
    pub fee_limit: i64,
}

fn trigger(owner: &Address, contract: &Address, data: Vec<u8>, call_value: i64) -> TriggerSmartContract {
    TriggerSmartContract {
        owner_address: owner.as_bytes().to_vec(),
        contract_address: contract.as_bytes().to_vec(),
        call_value,
        data,
        ..Default::default()
    }
}

/// Fails a constant call whose execution did not succeed, with the revert reason when there is one.
fn check_execution(op: &'static str, ext: &TransactionExtention) -> Result<()> {
    let code = ext
        .transaction
        .as_ref()
        .and_then(|tx| tx.ret.first())
        .map_or(ContractResult::Default as i32, |ret| ret.contract_ret);
    if code == ContractResult::Default as i32 || code == ContractResult::Success as i32 {
        return Ok(());
    }
    let output = ext.constant_result.first().map(Vec::as_slice).unwrap_or(&[]);
    let message = match revert_reason(output) {
        Some(reason) => format!("execution reverted: {}", reason),
        None => match ContractResult::try_from(code) {
            Ok(ContractResult::Revert) => "execution reverted".to_string(),
            Ok(other) => format!("execution failed: {:?}", other),
            Err(_) => format!("execution failed with code {}", code),
        },
    };
    Err(SdkError::Rejected { op, message })
}

/// The message of a Solidity `Error(string)` revert payload.
pub fn revert_reason(output: &[u8]) -> Option<String> {
    if output.len() < 4 || output[..4] != selector_of("Error(string)") {
        return None;
    }
    match decode(&[ParamType::String], &output[4..]).ok()?.pop()? {
        Value::String(reason) => Some(reason),
        _ => None,
    }
}

/// Applies `fee_limit` to the transaction of an envelope and refreshes its id.
fn apply_fee_limit(mut ext: TransactionExtention, fee_limit: i64) -> Result<TransactionExtention> {
    if let Some(tx) = ext.transaction.as_mut() {
        tx.set_fee_limit(fee_limit)?;
        ext.txid = tx.txid()?.to_vec();
    }
    Ok(ext)
}

impl<'a> ContractManager<'a> {
    pub fn new(client: &'a Client) -> Self {
        ContractManager { client }
    }

    /// Runs a call locally on the node without creating a transaction. The return data is in
    /// `constant_result`.
    pub async fn trigger_constant_contract(
        &self,
        ctx: &Context,
        owner: &Address,
        contract: &Address,
        data: Vec<u8>,
    ) -> Result<TransactionExtention> {
        let req = trigger(owner, contract, data, 0);
        let ext = self
            .client
            .wallet()
            .trigger_constant_contract(ctx, &req)
            .await?;
        check_extention("trigger_constant_contract", ext)
    }

    /// Builds an unsigned contract call paying at most `fee_limit` sun.
    pub async fn trigger_smart_contract(
        &self,
        ctx: &Context,
        owner: &Address,
        contract: &Address,
        data: Vec<u8>,
        call_value: i64,
        fee_limit: i64,
    ) -> Result<TransactionExtention> {
        check_positive("fee_limit", fee_limit)?;
        if call_value < 0 {
            return Err(SdkError::validation("call_value", "must not be negative"));
        }
        let req = trigger(owner, contract, data, call_value);
        let ext = self.client.wallet().trigger_contract(ctx, &req).await?;
        apply_fee_limit(check_extention("trigger_contract", ext)?, fee_limit)
    }

    /// Energy the call would consume.
    pub async fn estimate_energy(
        &self,
        ctx: &Context,
        owner: &Address,
        contract: &Address,
        data: Vec<u8>,
        call_value: i64,
    ) -> Result<i64> {
        let req = trigger(owner, contract, data, call_value);
        let msg = self.client.wallet().estimate_energy(ctx, &req).await?;
        if let Some(ret) = &msg.result {
            check_return("estimate_energy", ret)?;
        }
        Ok(msg.energy_required)
    }

    /// Builds an unsigned deployment; constructor arguments are appended to the bytecode.
    pub async fn deploy_contract(
        &self,
        ctx: &Context,
        req: &DeployRequest,
    ) -> Result<TransactionExtention> {
        check_non_empty("name", &req.name)?;
        check_positive("fee_limit", req.fee_limit)?;
        if req.bytecode.is_empty() {
            return Err(SdkError::validation("bytecode", "must not be empty"));
        }
        if !(0..=100).contains(&req.consume_user_resource_percent) {
            return Err(SdkError::validation(
                "consume_user_resource_percent",
                "must be within 0..=100",
            ));
        }
        let mut bytecode = req.bytecode.clone();
        bytecode.extend(ContractProcessor::new(req.abi.clone()).encode_constructor(&req.constructor_args)?);
        let contract = CreateSmartContract {
            owner_address: req.owner.as_bytes().to_vec(),
            new_contract: Some(SmartContract {
                origin_address: req.owner.as_bytes().to_vec(),
                abi: Some(WireAbi::from(&req.abi)),
                bytecode,
                call_value: req.call_value,
                consume_user_resource_percent: req.consume_user_resource_percent,
                name: req.name.clone(),
                origin_energy_limit: req.origin_energy_limit,
                ..Default::default()
            }),
            ..Default::default()
        };
        let ext = self.client.wallet().deploy_contract(ctx, &contract).await?;
        apply_fee_limit(check_extention("deploy_contract", ext)?, req.fee_limit)
    }

    pub async fn get_contract(&self, ctx: &Context, address: &Address) -> Result<SmartContract> {
        let req = BytesMessage {
            value: address.as_bytes().to_vec(),
        };
        self.client.wallet().get_contract(ctx, &req).await
    }

    pub async fn get_contract_info(
        &self,
        ctx: &Context,
        address: &Address,
    ) -> Result<SmartContractDataWrapper> {
        let req = BytesMessage {
            value: address.as_bytes().to_vec(),
        };
        self.client.wallet().get_contract_info(ctx, &req).await
    }

    /// A facade over the contract at `address`, using the interface recorded on chain.
    pub async fn contract(&self, ctx: &Context, address: &Address) -> Result<Contract> {
        let onchain = self.get_contract(ctx, address).await?;
        let abi = onchain
            .abi
            .as_ref()
            .filter(|abi| !abi.entrys.is_empty())
            .ok_or_else(|| SdkError::NotFound(format!("interface of contract {}", address)))?;
        Ok(Contract::new(self.client.clone(), address.clone(), Abi::from(abi)))
    }
}

/// A deployed contract bound to its interface.
#[derive(Clone)]
pub struct Contract {
    client: Client,
    address: Address,
    processor: Arc<ContractProcessor>,
}

impl Contract {
    pub fn new(client: Client, address: Address, abi: Abi) -> Self {
        Contract {
            client,
            address,
            processor: Arc::new(ContractProcessor::new(abi)),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn processor(&self) -> &ContractProcessor {
        &self.processor
    }

    /// Call data for `method` (bare name or full signature).
    pub fn encode(&self, method: &str, args: &[Value]) -> Result<Vec<u8>> {
        Ok(self.processor.encode_call(method, args)?)
    }

    /// Calls a method without creating a transaction and decodes what it returns. A reverted
    /// execution fails with [`SdkError::Rejected`] carrying the revert reason.
    pub async fn call(
        &self,
        ctx: &Context,
        caller: &Address,
        method: &str,
        args: &[Value],
    ) -> Result<CallResult> {
        let data = self.encode(method, args)?;
        let ext = self
            .client
            .contracts()
            .trigger_constant_contract(ctx, caller, &self.address, data)
            .await?;
        check_execution("call", &ext)?;
        let output = ext.constant_result.first().map(Vec::as_slice).unwrap_or(&[]);
        Ok(self.processor.decode_result(method, output)?)
    }

    /// Builds an unsigned transaction calling `method`.
    pub async fn transact(
        &self,
        ctx: &Context,
        caller: &Address,
        method: &str,
        args: &[Value],
        call_value: i64,
        fee_limit: i64,
    ) -> Result<TransactionExtention> {
        let data = self.encode(method, args)?;
        self.client
            .contracts()
            .trigger_smart_contract(ctx, caller, &self.address, data, call_value, fee_limit)
            .await
    }

    pub fn decode_input(&self, data: &[u8]) -> Result<DecodedInput> {
        Ok(self.processor.decode_input(data)?)
    }

    /// Decodes every log this contract emitted, skipping logs of other contracts.
    pub fn decode_logs(&self, logs: &[Log]) -> Result<Vec<DecodedEvent>> {
        let own = self.address.to_evm_bytes();
        let mine: Vec<&Log> = logs
            .iter()
            .filter(|log| log_emitter(log).map_or(false, |a| a == own))
            .collect();
        mine.into_iter()
            .map(|log| decode_log(&self.processor, log))
            .collect()
    }
}

/// The 20-byte emitter of a log, which nodes report in either address form.
fn log_emitter(log: &Log) -> Option<[u8; 20]> {
    match log.address.len() {
        20 => log.address.as_slice().try_into().ok(),
        21 => Address::from_bytes(&log.address).ok().map(|a| a.to_evm_bytes()),
        _ => None,
    }
}

/// Decodes one log with `processor`; a log whose topic is not declared comes back as an unknown event.
pub fn decode_log(processor: &ContractProcessor, log: &Log) -> Result<DecodedEvent> {
    Ok(processor.decode_event(&log.topics, &log.data)?)
}

/// Decodes every log of a transaction, whichever contract emitted it.
pub fn decode_logs(processor: &ContractProcessor, logs: &[Log]) -> Result<Vec<DecodedEvent>> {
    logs.iter().map(|log| decode_log(processor, log)).collect()
}
