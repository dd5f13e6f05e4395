use std::sync::Arc;
use std::time::{Duration, Instant};

use tronnet::{Context, Dialer, NetError, Pool};
use tronstructs::{Message, Return, TransactionExtention};

use crate::{
    AccountManager, ClientConfig, ContractManager, NetworkManager, ResourceManager, Result,
    SdkError, WalletStub,
};

/// Calls slower than this are logged as warnings.
const SLOW_CALL: Duration = Duration::from_secs(3);

/// A connection to one node. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    pool: Pool,
    timeout: Duration,
}

impl Client {
    /// Connects to `config.endpoint`, opening channels through `dialer`.
    ///
    /// The dialer owns the wire protocol, TLS included; the client only frames unary calls by
    /// method path.
    pub async fn connect(config: &ClientConfig, dialer: Arc<dyn Dialer>) -> Result<Self> {
        config.validate()?;
        let pool = Pool::connect(config.endpoint.clone(), dialer, config.pool_config())
            .await
            .map_err(|e| SdkError::transport("connect", e))?;
        log::debug!("client connected to {}", config.endpoint);
        Ok(Client {
            pool,
            timeout: config.timeout,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Deadline applied to calls whose context has none.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn close(&self) {
        self.pool.close()
    }

    pub fn wallet(&self) -> WalletStub<'_> {
        WalletStub::new(self)
    }

    pub fn accounts(&self) -> AccountManager<'_> {
        AccountManager::new(self)
    }

    pub fn network(&self) -> NetworkManager<'_> {
        NetworkManager::new(self)
    }

    pub fn resources(&self) -> ResourceManager<'_> {
        ResourceManager::new(self)
    }

    pub fn contracts(&self) -> ContractManager<'_> {
        ContractManager::new(self)
    }

    /// Performs one unary call: takes a channel from the pool for the duration of the call and
    /// decodes the response. A context without a deadline gets the client's default timeout.
    pub async fn invoke<Req: Message, Resp: Message + Default>(
        &self,
        ctx: &Context,
        op: &'static str,
        method: &str,
        request: &Req,
    ) -> Result<Resp> {
        let ctx = match ctx.deadline() {
            Some(_) => ctx.clone(),
            None => ctx.child_with_timeout(self.timeout),
        };
        let start = Instant::now();
        let channel = self
            .pool
            .acquire(&ctx)
            .await
            .map_err(|e| SdkError::transport(op, e))?;
        let response = ctx
            .run(channel.unary(method, request.encode_to_vec()))
            .await
            .map_err(|e| SdkError::transport(op, e))?;
        drop(channel);
        let elapsed = start.elapsed();
        if elapsed > SLOW_CALL {
            log::warn!("{} to {} took {:?}", op, self.pool.endpoint(), elapsed)
        }
        log::trace!("{} took {:?}", op, elapsed);
        Resp::decode(response.as_slice())
            .map_err(|e| SdkError::transport(op, NetError::Codec(e.to_string())))
    }
}

/// Turns a transaction envelope whose `result` is false into an error carrying the node's message.
pub(crate) fn check_extention(
    op: &'static str,
    ext: TransactionExtention,
) -> Result<TransactionExtention> {
    if let Some(ret) = &ext.result {
        check_return(op, ret)?;
    }
    Ok(ext)
}

pub(crate) fn check_return(op: &'static str, ret: &Return) -> Result<()> {
    if ret.result {
        Ok(())
    } else {
        Err(SdkError::Rejected {
            op,
            message: ret.message_text(),
        })
    }
}
