use troncrypt::Address;
use tronnet::Context;
use tronstructs::{
    Account, AccountCreateContract, AccountNetMessage, AccountResourceMessage, AccountType,
    TransactionExtention, TransferContract,
};

use crate::client::check_extention;
use crate::common::check_positive;
use crate::{Client, Result, SdkError};

/// Account queries and TRX transfers.
pub struct AccountManager<'a> {
    client: &'a Client,
}

fn account_query(address: &Address) -> Account {
    Account {
        address: address.as_bytes().to_vec(),
        ..Default::default()
    }
}

impl<'a> AccountManager<'a> {
    pub fn new(client: &'a Client) -> Self {
        AccountManager { client }
    }

    pub async fn get_account(&self, ctx: &Context, address: &Address) -> Result<Account> {
        self.client
            .wallet()
            .get_account(ctx, &account_query(address))
            .await
    }

    pub async fn get_account_resource(
        &self,
        ctx: &Context,
        address: &Address,
    ) -> Result<AccountResourceMessage> {
        self.client
            .wallet()
            .get_account_resource(ctx, &account_query(address))
            .await
    }

    pub async fn get_account_net(
        &self,
        ctx: &Context,
        address: &Address,
    ) -> Result<AccountNetMessage> {
        self.client
            .wallet()
            .get_account_net(ctx, &account_query(address))
            .await
    }

    /// Builds an unsigned transfer of `amount` sun from `from` to `to`.
    pub async fn create_transfer_transaction(
        &self,
        ctx: &Context,
        from: &Address,
        to: &Address,
        amount: i64,
    ) -> Result<TransactionExtention> {
        check_positive("amount", amount)?;
        if from == to {
            return Err(SdkError::validation("to", "cannot transfer to the sender"));
        }
        let contract = TransferContract {
            owner_address: from.as_bytes().to_vec(),
            to_address: to.as_bytes().to_vec(),
            amount,
        };
        let ext = self.client.wallet().create_transaction(ctx, &contract).await?;
        check_extention("create_transaction", ext)
    }

    /// Builds an unsigned transaction in which `owner` activates `account`.
    pub async fn create_account_transaction(
        &self,
        ctx: &Context,
        owner: &Address,
        account: &Address,
    ) -> Result<TransactionExtention> {
        let contract = AccountCreateContract {
            owner_address: owner.as_bytes().to_vec(),
            account_address: account.as_bytes().to_vec(),
            r#type: AccountType::Normal as i32,
        };
        let ext = self.client.wallet().create_account(ctx, &contract).await?;
        check_extention("create_account", ext)
    }
}
