use ethnum::U256;
use troncrypt::Address;
use tronabi::{CallResult, Value, TRC20_ABI};
use tronnet::Context;
use tronstructs::TransactionExtention;

use crate::{Client, Contract, Result, SdkError};

/// A TRC20 token contract.
///
/// Read-only calls run with the token's own address as the caller.
#[derive(Clone)]
pub struct Trc20 {
    contract: Contract,
}

fn single_output<T>(method: &'static str, result: CallResult, f: impl FnOnce(&Value) -> Option<T>) -> Result<T> {
    result
        .single()
        .as_ref()
        .and_then(f)
        .ok_or_else(|| SdkError::State(format!("{} returned an unexpected value", method)))
}

impl Trc20 {
    pub fn new(client: Client, address: Address) -> Self {
        Trc20 {
            contract: Contract::new(client, address, TRC20_ABI.clone()),
        }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn address(&self) -> &Address {
        self.contract.address()
    }

    async fn view(&self, ctx: &Context, method: &'static str, args: &[Value]) -> Result<CallResult> {
        self.contract
            .call(ctx, self.contract.address(), method, args)
            .await
    }

    pub async fn name(&self, ctx: &Context) -> Result<String> {
        let res = self.view(ctx, "name", &[]).await?;
        single_output("name", res, |v| v.as_str().map(str::to_owned))
    }

    pub async fn symbol(&self, ctx: &Context) -> Result<String> {
        let res = self.view(ctx, "symbol", &[]).await?;
        single_output("symbol", res, |v| v.as_str().map(str::to_owned))
    }

    pub async fn decimals(&self, ctx: &Context) -> Result<u8> {
        let res = self.view(ctx, "decimals", &[]).await?;
        single_output("decimals", res, Value::as_u8)
    }

    pub async fn total_supply(&self, ctx: &Context) -> Result<U256> {
        let res = self.view(ctx, "totalSupply", &[]).await?;
        single_output("totalSupply", res, Value::as_u256)
    }

    pub async fn balance_of(&self, ctx: &Context, owner: &Address) -> Result<U256> {
        let res = self.view(ctx, "balanceOf", &[owner.into()]).await?;
        single_output("balanceOf", res, Value::as_u256)
    }

    pub async fn allowance(&self, ctx: &Context, owner: &Address, spender: &Address) -> Result<U256> {
        let res = self
            .view(ctx, "allowance", &[owner.into(), spender.into()])
            .await?;
        single_output("allowance", res, Value::as_u256)
    }

    /// Builds an unsigned transfer of `amount` base units from `from` to `to`.
    pub async fn transfer(
        &self,
        ctx: &Context,
        from: &Address,
        to: &Address,
        amount: U256,
        fee_limit: i64,
    ) -> Result<TransactionExtention> {
        self.contract
            .transact(ctx, from, "transfer", &[to.into(), amount.into()], 0, fee_limit)
            .await
    }

    pub async fn approve(
        &self,
        ctx: &Context,
        owner: &Address,
        spender: &Address,
        amount: U256,
        fee_limit: i64,
    ) -> Result<TransactionExtention> {
        self.contract
            .transact(ctx, owner, "approve", &[spender.into(), amount.into()], 0, fee_limit)
            .await
    }

    /// Builds an unsigned transfer by `spender` out of `from`'s allowance.
    pub async fn transfer_from(
        &self,
        ctx: &Context,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
        fee_limit: i64,
    ) -> Result<TransactionExtention> {
        self.contract
            .transact(
                ctx,
                spender,
                "transferFrom",
                &[from.into(), to.into(), amount.into()],
                0,
                fee_limit,
            )
            .await
    }
}
