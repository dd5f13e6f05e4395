use tronnet::Context;
use tronstructs::*;

use crate::{Client, Result};

/// Service name of the node's wallet interface.
pub const WALLET_SERVICE: &str = "protocol.Wallet";

/// Typed calls of the node's wallet interface. Responses are returned as the node sent them.
#[derive(Clone, Copy)]
pub struct WalletStub<'a> {
    client: &'a Client,
}

impl<'a> WalletStub<'a> {
    pub fn new(client: &'a Client) -> Self {
        WalletStub { client }
    }
}

macro_rules! wallet_rpcs {
    ($($fn_name:ident => $method:literal ($req:ty) -> $resp:ty;)*) => {
        impl<'a> WalletStub<'a> {
            $(
                #[doc = concat!("Calls `/protocol.Wallet/", $method, "`.")]
                pub async fn $fn_name(&self, ctx: &Context, request: &$req) -> Result<$resp> {
                    self.client
                        .invoke(
                            ctx,
                            stringify!($fn_name),
                            concat!("/protocol.Wallet/", $method),
                            request,
                        )
                        .await
                }
            )*
        }
    };
}

wallet_rpcs! {
    get_account => "GetAccount" (Account) -> Account;
    get_account_resource => "GetAccountResource" (Account) -> AccountResourceMessage;
    get_account_net => "GetAccountNet" (Account) -> AccountNetMessage;
    get_now_block => "GetNowBlock2" (EmptyMessage) -> BlockExtention;
    get_block_by_num => "GetBlockByNum2" (NumberMessage) -> BlockExtention;
    get_block_by_id => "GetBlockById" (BytesMessage) -> Block;
    get_block_by_limit_next => "GetBlockByLimitNext2" (BlockLimit) -> BlockListExtention;
    get_block_by_latest_num => "GetBlockByLatestNum2" (NumberMessage) -> BlockListExtention;
    get_transaction_by_id => "GetTransactionById" (BytesMessage) -> Transaction;
    get_transaction_info_by_id => "GetTransactionInfoById" (BytesMessage) -> TransactionInfo;
    get_node_info => "GetNodeInfo" (EmptyMessage) -> NodeInfo;
    get_chain_parameters => "GetChainParameters" (EmptyMessage) -> ChainParameters;
    list_nodes => "ListNodes" (EmptyMessage) -> NodeList;
    get_delegated_resource_v2 => "GetDelegatedResourceV2" (DelegatedResourceMessage) -> DelegatedResourceList;
    get_delegated_resource_account_index_v2 => "GetDelegatedResourceAccountIndexV2" (BytesMessage) -> DelegatedResourceAccountIndex;
    get_can_delegated_max_size => "GetCanDelegatedMaxSize" (CanDelegatedMaxSizeRequestMessage) -> CanDelegatedMaxSizeResponseMessage;
    get_available_unfreeze_count => "GetAvailableUnfreezeCount" (GetAvailableUnfreezeCountRequestMessage) -> GetAvailableUnfreezeCountResponseMessage;
    get_can_withdraw_unfreeze_amount => "GetCanWithdrawUnfreezeAmount" (CanWithdrawUnfreezeAmountRequestMessage) -> CanWithdrawUnfreezeAmountResponseMessage;
    create_transaction => "CreateTransaction2" (TransferContract) -> TransactionExtention;
    create_account => "CreateAccount2" (AccountCreateContract) -> TransactionExtention;
    freeze_balance_v2 => "FreezeBalanceV2" (FreezeBalanceV2Contract) -> TransactionExtention;
    unfreeze_balance_v2 => "UnfreezeBalanceV2" (UnfreezeBalanceV2Contract) -> TransactionExtention;
    delegate_resource => "DelegateResource" (DelegateResourceContract) -> TransactionExtention;
    undelegate_resource => "UnDelegateResource" (UnDelegateResourceContract) -> TransactionExtention;
    withdraw_expire_unfreeze => "WithdrawExpireUnfreeze" (WithdrawExpireUnfreezeContract) -> TransactionExtention;
    trigger_constant_contract => "TriggerConstantContract" (TriggerSmartContract) -> TransactionExtention;
    trigger_contract => "TriggerContract" (TriggerSmartContract) -> TransactionExtention;
    estimate_energy => "EstimateEnergy" (TriggerSmartContract) -> EstimateEnergyMessage;
    deploy_contract => "DeployContract" (CreateSmartContract) -> TransactionExtention;
    get_contract => "GetContract" (BytesMessage) -> SmartContract;
    get_contract_info => "GetContractInfo" (BytesMessage) -> SmartContractDataWrapper;
    broadcast_transaction => "BroadcastTransaction" (Transaction) -> Return;
}
