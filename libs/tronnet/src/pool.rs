use log::{debug, trace, warn};
use parking_lot::Mutex;
use smol::lock::{Semaphore, SemaphoreGuardArc};
use smol::Timer;
use smol_timeout::TimeoutExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crate::{Channel, ChannelState, Context, Dialer, Endpoint, NetError, Result};

/// Sizing and timing of a [`Pool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Channels dialed eagerly on creation.
    pub init_conns: usize,
    /// Upper bound on channels, and therefore on calls in flight.
    pub max_conns: usize,
    /// Idle channels beyond `init_conns` are closed after this long.
    pub max_idle: Duration,
    pub health_interval: Duration,
    pub dial_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            init_conns: 1,
            max_conns: 4,
            max_idle: Duration::from_secs(300),
            health_interval: Duration::from_secs(30),
            dial_timeout: Duration::from_secs(10),
        }
    }
}

struct IdleChannel {
    channel: Arc<dyn Channel>,
    since: Instant,
}

struct PoolInner {
    endpoint: Endpoint,
    dialer: Arc<dyn Dialer>,
    config: PoolConfig,
    permits: Arc<Semaphore>,
    idle: Mutex<VecDeque<IdleChannel>>,
    open: AtomicUsize,
    in_flight: AtomicUsize,
    closed: AtomicBool,
}

/// A bounded pool of channels to one endpoint.
///
/// Every call holds one channel exclusively from `acquire` until the returned guard drops. When
/// all `max_conns` channels are out, `acquire` waits for a release or for the caller's context to
/// give up.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Creates the pool, dialing `init_conns` channels up front and starting the health checker.
    pub async fn connect(
        endpoint: Endpoint,
        dialer: Arc<dyn Dialer>,
        config: PoolConfig,
    ) -> Result<Self> {
        if config.init_conns == 0 || config.max_conns < config.init_conns {
            return Err(NetError::InvalidEndpoint(format!(
                "{} (pool sizing {}..{})",
                endpoint, config.init_conns, config.max_conns
            )));
        }
        let inner = Arc::new(PoolInner {
            permits: Arc::new(Semaphore::new(config.max_conns)),
            idle: Mutex::new(VecDeque::with_capacity(config.max_conns)),
            open: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            endpoint,
            dialer,
            config,
        });
        for _ in 0..inner.config.init_conns {
            let channel = inner.dial().await?;
            inner.idle.lock().push_back(IdleChannel {
                channel,
                since: Instant::now(),
            });
        }
        debug!(
            "pool to {} ready with {} channels",
            inner.endpoint, inner.config.init_conns
        );
        let weak = Arc::downgrade(&inner);
        let interval = inner.config.health_interval;
        smolscale::spawn(health_checker(weak, interval)).detach();
        Ok(Pool { inner })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Takes a ready channel, dialing a new one if none is idle.
    pub async fn acquire(&self, ctx: &Context) -> Result<PooledChannel> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::SeqCst) {
            return Err(NetError::PoolClosed);
        }
        ctx.check()?;
        let permit = match inner.permits.try_acquire_arc() {
            Some(permit) => permit,
            None => {
                trace!("pool to {} exhausted, waiting", inner.endpoint);
                let start = Instant::now();
                let permit = ctx
                    .run(async { Ok::<_, NetError>(inner.permits.acquire_arc().await) })
                    .await?;
                trace!("waited {:?} for a channel", start.elapsed());
                permit
            }
        };
        if inner.closed.load(Ordering::SeqCst) {
            return Err(NetError::PoolClosed);
        }
        let channel = match inner.take_idle() {
            Some(channel) => channel,
            None => ctx.run(inner.dial()).await?,
        };
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        Ok(PooledChannel {
            channel,
            pool: self.inner.clone(),
            _permit: permit,
        })
    }

    /// Closes every idle channel and fails later acquires. Channels in use are dropped on release.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let drained = self.inner.idle.lock().drain(..).count();
        self.inner.open.fetch_sub(drained, Ordering::SeqCst);
        debug!("pool to {} closed", self.inner.endpoint);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    pub fn open_count(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Runs one health sweep immediately.
    pub fn check_health(&self) {
        self.inner.evict();
    }
}

impl PoolInner {
    async fn dial(&self) -> Result<Arc<dyn Channel>> {
        trace!("dialing {}", self.endpoint);
        let channel = self
            .dialer
            .dial(&self.endpoint)
            .timeout(self.config.dial_timeout)
            .await
            .ok_or(NetError::DialTimeout)??;
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(channel)
    }

    /// Pops the most recently used ready channel, discarding unhealthy ones on the way.
    fn take_idle(&self) -> Option<Arc<dyn Channel>> {
        let mut idle = self.idle.lock();
        while let Some(entry) = idle.pop_back() {
            if entry.channel.state() == ChannelState::Ready {
                return Some(entry.channel);
            }
            debug!("discarding {:?} channel to {}", entry.channel.state(), self.endpoint);
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
        None
    }

    fn release(&self, channel: Arc<dyn Channel>) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) || channel.state() != ChannelState::Ready {
            self.open.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        self.idle.lock().push_back(IdleChannel {
            channel,
            since: Instant::now(),
        });
    }

    /// Drops shut-down channels, and channels idle past `max_idle` while more than `init_conns`
    /// remain.
    fn evict(&self) {
        let now = Instant::now();
        let mut idle = self.idle.lock();
        let before = idle.len();
        idle.retain(|entry| entry.channel.state() != ChannelState::Shutdown);
        // oldest entries sit at the front
        while idle.len() > self.config.init_conns {
            match idle.front() {
                Some(entry) if now.duration_since(entry.since) > self.config.max_idle => {
                    idle.pop_front();
                }
                _ => break,
            }
        }
        let evicted = before - idle.len();
        if evicted > 0 {
            debug!("evicted {} channels to {}", evicted, self.endpoint);
            self.open.fetch_sub(evicted, Ordering::SeqCst);
        }
    }
}

async fn health_checker(pool: Weak<PoolInner>, interval: Duration) {
    loop {
        Timer::after(interval).await;
        let pool = match pool.upgrade() {
            Some(pool) => pool,
            None => return,
        };
        if pool.closed.load(Ordering::SeqCst) {
            return;
        }
        pool.evict();
        if pool.open.load(Ordering::SeqCst) == 0 {
            warn!("no open channels to {}", pool.endpoint);
        }
    }
}

/// A channel held by one call. Dropping it returns the channel to the pool.
pub struct PooledChannel {
    channel: Arc<dyn Channel>,
    pool: Arc<PoolInner>,
    _permit: SemaphoreGuardArc,
}

impl PooledChannel {
    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }
}

impl std::ops::Deref for PooledChannel {
    type Target = dyn Channel;

    fn deref(&self) -> &Self::Target {
        self.channel.as_ref()
    }
}

impl Drop for PooledChannel {
    fn drop(&mut self) {
        // the permit field drops after this, so a waiter wakes to a refilled idle list
        self.pool.release(self.channel.clone());
    }
}
