//! In-memory channels for tests of code built on the pool.

use async_trait::async_trait;
use parking_lot::Mutex;
use smol::Timer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::{Channel, ChannelState, Dialer, Endpoint, NetError, Result, StatusCode};

pub type Handler = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// Handlers keyed by method path. Unrouted methods fail with `Unimplemented`.
#[derive(Clone, Default)]
pub struct MockService {
    routes: HashMap<String, Handler>,
    fallback: Option<Handler>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        mut self,
        method: &str,
        handler: impl Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        self.routes.insert(method.to_owned(), Arc::new(handler));
        self
    }

    pub fn fallback(mut self, handler: impl Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static) -> Self {
        self.fallback = Some(Arc::new(handler));
        self
    }

    fn handle(&self, method: &str, request: &[u8]) -> Result<Vec<u8>> {
        match self.routes.get(method).or(self.fallback.as_ref()) {
            Some(handler) => handler(request),
            None => Err(NetError::status(
                StatusCode::Unimplemented,
                format!("no route for {}", method),
            )),
        }
    }
}

#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// A channel answering from a [`MockService`], optionally after a delay.
pub struct MockChannel {
    service: MockService,
    delay: Option<Duration>,
    state: Mutex<ChannelState>,
    calls: Mutex<Vec<String>>,
    gauge: Arc<Gauge>,
}

impl MockChannel {
    pub fn new(service: MockService) -> Self {
        MockChannel {
            service,
            delay: None,
            state: Mutex::new(ChannelState::Ready),
            calls: Mutex::new(vec![]),
            gauge: Arc::new(Gauge::default()),
        }
    }

    /// Answers every method with the request bytes.
    pub fn echo() -> Self {
        Self::new(MockService::new().fallback(|req| Ok(req.to_vec())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_state(&self, state: ChannelState) {
        *self.state.lock() = state;
    }

    /// Methods invoked on this channel, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn sibling(&self) -> Self {
        MockChannel {
            service: self.service.clone(),
            delay: self.delay,
            state: Mutex::new(ChannelState::Ready),
            calls: Mutex::new(vec![]),
            gauge: self.gauge.clone(),
        }
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    async fn unary(&self, method: &str, request: Vec<u8>) -> Result<Vec<u8>> {
        if self.state() == ChannelState::Shutdown {
            return Err(NetError::ChannelClosed);
        }
        self.calls.lock().push(method.to_owned());
        let now = self.gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            Timer::after(delay).await;
        }
        let res = self.service.handle(method, &request);
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
        res
    }
}

/// Hands out fresh [`MockChannel`]s cloned from a template.
pub struct MockDialer {
    template: MockChannel,
    channels: Mutex<Vec<Arc<MockChannel>>>,
    failing: AtomicBool,
}

impl MockDialer {
    pub fn new(template: MockChannel) -> Self {
        MockDialer {
            template,
            channels: Mutex::new(vec![]),
            failing: AtomicBool::new(false),
        }
    }

    pub fn dial_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Every channel dialed so far, in dial order.
    pub fn channels(&self) -> Vec<Arc<MockChannel>> {
        self.channels.lock().clone()
    }

    /// Makes later dials fail with `Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Highest number of calls observed in flight at once across all channels.
    pub fn peak_in_flight(&self) -> usize {
        self.template.gauge.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, endpoint: &Endpoint) -> Result<Arc<dyn Channel>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NetError::status(
                StatusCode::Unavailable,
                format!("{} unreachable", endpoint),
            ));
        }
        let channel = Arc::new(self.template.sibling());
        self.channels.lock().push(channel.clone());
        Ok(channel)
    }
}
