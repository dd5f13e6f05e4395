use troncrypt::Address;
use tronnet::Context;
use tronstructs::{
    BytesMessage, CanDelegatedMaxSizeRequestMessage, CanDelegatedMaxSizeResponseMessage,
    CanWithdrawUnfreezeAmountRequestMessage, CanWithdrawUnfreezeAmountResponseMessage,
    DelegateResourceContract, DelegatedResourceAccountIndex, DelegatedResourceList,
    DelegatedResourceMessage, FreezeBalanceV2Contract, GetAvailableUnfreezeCountRequestMessage,
    GetAvailableUnfreezeCountResponseMessage, ResourceCode, TransactionExtention,
    UnDelegateResourceContract, UnfreezeBalanceV2Contract, WithdrawExpireUnfreezeContract,
};

use crate::client::check_extention;
use crate::common::check_positive;
use crate::{Client, Result, SdkError};

/// Staking: freezing TRX for bandwidth or energy, and delegating the resources it yields.
pub struct ResourceManager<'a> {
    client: &'a Client,
}

fn check_delegable(resource: ResourceCode) -> Result<()> {
    match resource {
        ResourceCode::Bandwidth | ResourceCode::Energy => Ok(()),
        other => Err(SdkError::validation(
            "resource",
            format!("{:?} cannot be delegated", other),
        )),
    }
}

impl<'a> ResourceManager<'a> {
    pub fn new(client: &'a Client) -> Self {
        ResourceManager { client }
    }

    /// Resources `from` has delegated to `to`.
    pub async fn get_delegated_resource_v2(
        &self,
        ctx: &Context,
        from: &Address,
        to: &Address,
    ) -> Result<DelegatedResourceList> {
        let req = DelegatedResourceMessage {
            from_address: from.as_bytes().to_vec(),
            to_address: to.as_bytes().to_vec(),
        };
        self.client.wallet().get_delegated_resource_v2(ctx, &req).await
    }

    /// Accounts `address` delegates to and receives delegations from.
    pub async fn get_delegated_resource_account_index_v2(
        &self,
        ctx: &Context,
        address: &Address,
    ) -> Result<DelegatedResourceAccountIndex> {
        let req = BytesMessage {
            value: address.as_bytes().to_vec(),
        };
        self.client
            .wallet()
            .get_delegated_resource_account_index_v2(ctx, &req)
            .await
    }

    pub async fn get_can_delegated_max_size(
        &self,
        ctx: &Context,
        owner: &Address,
        resource: ResourceCode,
    ) -> Result<CanDelegatedMaxSizeResponseMessage> {
        check_delegable(resource)?;
        let req = CanDelegatedMaxSizeRequestMessage {
            r#type: resource as i32,
            owner_address: owner.as_bytes().to_vec(),
        };
        self.client.wallet().get_can_delegated_max_size(ctx, &req).await
    }

    pub async fn get_available_unfreeze_count(
        &self,
        ctx: &Context,
        owner: &Address,
    ) -> Result<GetAvailableUnfreezeCountResponseMessage> {
        let req = GetAvailableUnfreezeCountRequestMessage {
            owner_address: owner.as_bytes().to_vec(),
        };
        self.client
            .wallet()
            .get_available_unfreeze_count(ctx, &req)
            .await
    }

    /// Amount `owner` could withdraw at `timestamp_ms`.
    pub async fn get_can_withdraw_unfreeze_amount(
        &self,
        ctx: &Context,
        owner: &Address,
        timestamp_ms: i64,
    ) -> Result<CanWithdrawUnfreezeAmountResponseMessage> {
        if timestamp_ms < 0 {
            return Err(SdkError::validation("timestamp", "must not be negative"));
        }
        let req = CanWithdrawUnfreezeAmountRequestMessage {
            owner_address: owner.as_bytes().to_vec(),
            timestamp: timestamp_ms,
        };
        self.client
            .wallet()
            .get_can_withdraw_unfreeze_amount(ctx, &req)
            .await
    }

    pub async fn create_freeze_transaction(
        &self,
        ctx: &Context,
        owner: &Address,
        amount: i64,
        resource: ResourceCode,
    ) -> Result<TransactionExtention> {
        check_positive("amount", amount)?;
        let contract = FreezeBalanceV2Contract {
            owner_address: owner.as_bytes().to_vec(),
            frozen_balance: amount,
            resource: resource as i32,
        };
        let ext = self.client.wallet().freeze_balance_v2(ctx, &contract).await?;
        check_extention("freeze_balance_v2", ext)
    }

    pub async fn create_unfreeze_transaction(
        &self,
        ctx: &Context,
        owner: &Address,
        amount: i64,
        resource: ResourceCode,
    ) -> Result<TransactionExtention> {
        check_positive("amount", amount)?;
        let contract = UnfreezeBalanceV2Contract {
            owner_address: owner.as_bytes().to_vec(),
            unfreeze_balance: amount,
            resource: resource as i32,
        };
        let ext = self
            .client
            .wallet()
            .unfreeze_balance_v2(ctx, &contract)
            .await?;
        check_extention("unfreeze_balance_v2", ext)
    }

    /// Delegates `amount` sun worth of `resource` to `receiver`. A locked delegation cannot be
    /// reclaimed for `lock_period` blocks.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_delegate_resource_transaction(
        &self,
        ctx: &Context,
        owner: &Address,
        receiver: &Address,
        amount: i64,
        resource: ResourceCode,
        lock: bool,
        lock_period: i64,
    ) -> Result<TransactionExtention> {
        check_positive("amount", amount)?;
        check_delegable(resource)?;
        if owner == receiver {
            return Err(SdkError::validation("receiver", "cannot delegate to the owner"));
        }
        if lock_period < 0 {
            return Err(SdkError::validation("lock_period", "must not be negative"));
        }
        let contract = DelegateResourceContract {
            owner_address: owner.as_bytes().to_vec(),
            resource: resource as i32,
            balance: amount,
            receiver_address: receiver.as_bytes().to_vec(),
            lock,
            lock_period,
        };
        let ext = self.client.wallet().delegate_resource(ctx, &contract).await?;
        check_extention("delegate_resource", ext)
    }

    pub async fn create_undelegate_resource_transaction(
        &self,
        ctx: &Context,
        owner: &Address,
        receiver: &Address,
        amount: i64,
        resource: ResourceCode,
    ) -> Result<TransactionExtention> {
        check_positive("amount", amount)?;
        check_delegable(resource)?;
        let contract = UnDelegateResourceContract {
            owner_address: owner.as_bytes().to_vec(),
            resource: resource as i32,
            balance: amount,
            receiver_address: receiver.as_bytes().to_vec(),
        };
        let ext = self
            .client
            .wallet()
            .undelegate_resource(ctx, &contract)
            .await?;
        check_extention("undelegate_resource", ext)
    }

    /// Withdraws every unfrozen balance whose waiting period has passed.
    pub async fn create_withdraw_expire_unfreeze_transaction(
        &self,
        ctx: &Context,
        owner: &Address,
    ) -> Result<TransactionExtention> {
        let contract = WithdrawExpireUnfreezeContract {
            owner_address: owner.as_bytes().to_vec(),
        };
        let ext = self
            .client
            .wallet()
            .withdraw_expire_unfreeze(ctx, &contract)
            .await?;
        check_extention("withdraw_expire_unfreeze", ext)
    }
}
