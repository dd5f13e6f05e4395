use std::time::Duration;

use tronnet::Context;
use tronstructs::{
    Block, BlockExtention, BlockLimit, BlockListExtention, BytesMessage, ChainParameters,
    EmptyMessage, NodeInfo, NodeList, NumberMessage, Return, Transaction, TransactionInfo,
};

use crate::client::check_return;
use crate::common::{check_block_number, parse_id};
use crate::{Client, Result, SdkError};

/// Interval between polls of [`NetworkManager::wait_for_transaction_info`]; one block time.
pub const TX_INFO_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Most blocks a single range query may return.
pub const MAX_BLOCK_RANGE: i64 = 100;

/// Blocks, transactions, and node state.
pub struct NetworkManager<'a> {
    client: &'a Client,
}

impl<'a> NetworkManager<'a> {
    pub fn new(client: &'a Client) -> Self {
        NetworkManager { client }
    }

    pub async fn get_now_block(&self, ctx: &Context) -> Result<BlockExtention> {
        let block = self.client.wallet().get_now_block(ctx, &EmptyMessage {}).await?;
        if block.is_empty() {
            return Err(SdkError::NotFound("latest block".into()));
        }
        Ok(block)
    }

    /// Fails with `NotFound` when the chain has no block `num` yet.
    pub async fn get_block_by_number(&self, ctx: &Context, num: i64) -> Result<BlockExtention> {
        check_block_number(num)?;
        let block = self
            .client
            .wallet()
            .get_block_by_num(ctx, &NumberMessage { num })
            .await?;
        if block.is_empty() {
            return Err(SdkError::NotFound(format!("block {}", num)));
        }
        Ok(block)
    }

    pub async fn get_block_by_id(&self, ctx: &Context, id: &str) -> Result<Block> {
        let id = parse_id("block id", id)?;
        let block = self
            .client
            .wallet()
            .get_block_by_id(
                ctx,
                &BytesMessage {
                    value: id.to_vec(),
                },
            )
            .await?;
        if block.block_header.is_none() {
            return Err(SdkError::NotFound(format!("block {}", id.to_hex())));
        }
        Ok(block)
    }

    /// Blocks numbered `start` (inclusive) to `end` (exclusive).
    pub async fn get_blocks_by_limit(
        &self,
        ctx: &Context,
        start: i64,
        end: i64,
    ) -> Result<BlockListExtention> {
        check_block_number(start)?;
        if end <= start || end - start > MAX_BLOCK_RANGE {
            return Err(SdkError::validation(
                "block range",
                format!(
                    "{}..{} must be non-empty and span at most {} blocks",
                    start, end, MAX_BLOCK_RANGE
                ),
            ));
        }
        let req = BlockLimit {
            start_num: start,
            end_num: end,
        };
        self.client.wallet().get_block_by_limit_next(ctx, &req).await
    }

    /// The `count` most recent blocks.
    pub async fn get_latest_blocks(&self, ctx: &Context, count: i64) -> Result<BlockListExtention> {
        if count <= 0 || count > MAX_BLOCK_RANGE {
            return Err(SdkError::validation(
                "count",
                format!("{} is not in 1..={}", count, MAX_BLOCK_RANGE),
            ));
        }
        self.client
            .wallet()
            .get_block_by_latest_num(ctx, &NumberMessage { num: count })
            .await
    }

    /// An unknown id yields an empty transaction rather than an error.
    pub async fn get_transaction_by_id(&self, ctx: &Context, id: &str) -> Result<Transaction> {
        let id = parse_id("transaction id", id)?;
        self.client
            .wallet()
            .get_transaction_by_id(
                ctx,
                &BytesMessage {
                    value: id.to_vec(),
                },
            )
            .await
    }

    /// An unknown or unconfirmed id yields an empty info rather than an error.
    pub async fn get_transaction_info_by_id(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<TransactionInfo> {
        let id = parse_id("transaction id", id)?;
        self.client
            .wallet()
            .get_transaction_info_by_id(
                ctx,
                &BytesMessage {
                    value: id.to_vec(),
                },
            )
            .await
    }

    /// Polls until the transaction is recorded in a block, making at most `retries` attempts
    /// [`TX_INFO_POLL_INTERVAL`] apart.
    pub async fn wait_for_transaction_info(
        &self,
        ctx: &Context,
        id: &str,
        retries: usize,
    ) -> Result<TransactionInfo> {
        self.wait_for_transaction_info_every(ctx, id, retries, TX_INFO_POLL_INTERVAL)
            .await
    }

    pub async fn wait_for_transaction_info_every(
        &self,
        ctx: &Context,
        id: &str,
        retries: usize,
        interval: Duration,
    ) -> Result<TransactionInfo> {
        let parsed = parse_id("transaction id", id)?;
        if retries == 0 {
            return Err(SdkError::validation("retries", "must be at least 1"));
        }
        for attempt in 1..=retries {
            let info = self.get_transaction_info_by_id(ctx, id).await?;
            if info.is_confirmed() {
                return Ok(info);
            }
            if attempt < retries {
                log::trace!(
                    "transaction {} unconfirmed after attempt {}",
                    parsed.to_hex(),
                    attempt
                );
                ctx.sleep(interval).await?;
            }
        }
        Err(SdkError::NotFound(format!(
            "info of transaction {} after {} attempts",
            parsed.to_hex(),
            retries
        )))
    }

    pub async fn get_node_info(&self, ctx: &Context) -> Result<NodeInfo> {
        self.client.wallet().get_node_info(ctx, &EmptyMessage {}).await
    }

    pub async fn get_chain_parameters(&self, ctx: &Context) -> Result<ChainParameters> {
        self.client
            .wallet()
            .get_chain_parameters(ctx, &EmptyMessage {})
            .await
    }

    pub async fn list_nodes(&self, ctx: &Context) -> Result<NodeList> {
        self.client.wallet().list_nodes(ctx, &EmptyMessage {}).await
    }

    /// Submits a signed transaction. Unsigned transactions are refused without contacting the
    /// node, as is any transaction the node rejects.
    pub async fn broadcast_transaction(&self, ctx: &Context, tx: &Transaction) -> Result<Return> {
        tx.ensure_signable()?;
        if !tx.is_signed() {
            return Err(SdkError::State(
                "cannot broadcast an unsigned transaction".into(),
            ));
        }
        let ret = self.client.wallet().broadcast_transaction(ctx, tx).await?;
        check_return("broadcast_transaction", &ret)?;
        log::debug!("broadcast transaction {}", tx.txid()?.to_hex());
        Ok(ret)
    }
}
