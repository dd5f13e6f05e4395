use event_listener::Event;
use smol::prelude::*;
use smol::Timer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::NetError;

/// Deadline and cancellation scope of a call. Cheap to clone; clones share cancellation.
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<Arc<CancelState>>,
}

struct CancelState {
    canceled: AtomicBool,
    event: Event,
}

impl Default for CancelState {
    fn default() -> Self {
        CancelState {
            canceled: AtomicBool::new(false),
            event: Event::new(),
        }
    }
}

impl std::fmt::Debug for CancelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelState")
            .field("canceled", &self.canceled.load(Ordering::Relaxed))
            .finish()
    }
}

/// Cancels every context derived from the one it was created with.
#[derive(Clone, Debug)]
pub struct CancelHandle(Arc<CancelState>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.canceled.store(true, Ordering::SeqCst);
        self.0.event.notify(usize::MAX);
    }
}

impl Context {
    /// A context with neither deadline nor cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Context {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// Derives a context whose deadline is the earlier of this one's and `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        Context {
            deadline: Some(self.deadline.map_or(candidate, |d| d.min(candidate))),
            cancel: self.cancel.clone(),
        }
    }

    /// Attaches a cancellation handle. A context that already had one keeps it, so cancelling
    /// either handle aborts the call.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let state = self.cancel.get_or_insert_with(Default::default).clone();
        (self, CancelHandle(state))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |c| c.canceled.load(Ordering::SeqCst))
    }

    /// Fails if the context is already canceled or past its deadline.
    pub fn check(&self) -> Result<(), NetError> {
        if self.is_canceled() {
            return Err(NetError::Canceled);
        }
        if self.deadline.map_or(false, |d| Instant::now() >= d) {
            return Err(NetError::DeadlineExceeded);
        }
        Ok(())
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => {
                Timer::at(deadline).await;
            }
            None => smol::future::pending().await,
        }
    }

    async fn canceled(&self) {
        let state = match &self.cancel {
            Some(state) => state,
            None => return smol::future::pending().await,
        };
        loop {
            if state.canceled.load(Ordering::SeqCst) {
                return;
            }
            let listener = state.event.listen();
            if state.canceled.load(Ordering::SeqCst) {
                return;
            }
            listener.await;
        }
    }

    /// Runs `fut` until it completes, the deadline passes, or the context is canceled. An
    /// abandoned future is dropped, discarding its partial work.
    pub async fn run<T, E: From<NetError>>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, E> {
        self.check()?;
        let canceled = async {
            self.canceled().await;
            Err(NetError::Canceled.into())
        };
        let expired = async {
            self.expired().await;
            Err(NetError::DeadlineExceeded.into())
        };
        fut.or(canceled).or(expired).await
    }

    /// Sleeps for `duration`, waking early with an error on cancellation or deadline.
    pub async fn sleep(&self, duration: Duration) -> Result<(), NetError> {
        self.run(async {
            Timer::after(duration).await;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_fires() {
        let ctx = Context::with_timeout(Duration::from_millis(20));
        let res: Result<(), NetError> = smol::block_on(ctx.run(smol::future::pending()));
        assert!(matches!(res, Err(NetError::DeadlineExceeded)));
        assert!(matches!(ctx.check(), Err(NetError::DeadlineExceeded)));
    }

    #[test]
    fn completes_before_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        let res = smol::block_on(ctx.run(async { Ok::<_, NetError>(7) }));
        assert_eq!(res.unwrap(), 7);
        assert!(ctx.remaining().unwrap() > Duration::from_secs(1));
    }

    #[test]
    fn cancellation_wakes_waiters() {
        let (ctx, handle) = Context::background().with_cancel();
        let waiter = {
            let ctx = ctx.clone();
            smolscale::spawn(async move { ctx.run::<(), NetError>(smol::future::pending()).await })
        };
        smol::block_on(async {
            Timer::after(Duration::from_millis(20)).await;
            handle.cancel();
            assert!(matches!(waiter.await, Err(NetError::Canceled)));
        });
        assert!(ctx.is_canceled());
        assert!(matches!(ctx.check(), Err(NetError::Canceled)));
    }

    #[test]
    fn child_deadline_never_extends() {
        let parent = Context::with_timeout(Duration::from_millis(10));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
        let loose = Context::background().child_with_timeout(Duration::from_secs(1));
        assert!(loose.deadline().is_some());
    }
}
