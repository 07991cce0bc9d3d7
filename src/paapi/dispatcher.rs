//! Serializing request dispatcher.
//!
//! One actor task owns the last-dispatch watermark and runs queued calls
//! strictly one at a time in FIFO order, waiting so that consecutive call
//! starts are never closer than the configured minimum interval. Callers
//! hold cheap cloneable handles.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, Instrument, Span};

use super::error::{PaapiError, PaapiResult};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Minimum gap between call starts for a requests-per-second ceiling.
///
/// Non-positive or non-finite rates, and rates so small the interval does not
/// fit in a `Duration`, fall back to one request per second.
pub fn interval_for_rate(requests_per_second: f64) -> Duration {
    if !(requests_per_second.is_finite() && requests_per_second > 0.0) {
        return Duration::from_secs(1);
    }
    Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::from_secs(1))
}

/// Handle to the dispatcher actor.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
    min_interval: Duration,
    dispatched: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Spawn a dispatcher for the given rate. Must be called inside a tokio runtime.
    pub fn new(requests_per_second: f64) -> Self {
        Self::with_interval(interval_for_rate(requests_per_second), Span::current())
    }

    /// Spawn a dispatcher with an explicit minimum interval and parent span.
    pub fn with_interval(min_interval: Duration, span: Span) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatched = Arc::new(AtomicU64::new(0));
        tokio::spawn(run(rx, min_interval, dispatched.clone()).instrument(span));
        Self {
            tx,
            min_interval,
            dispatched,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of calls started so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Queue a call and wait for its output.
    ///
    /// Once queued the call always runs, even if the returned future is dropped.
    pub async fn enqueue<F, T>(&self, call: F) -> PaapiResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = done_tx.send(call.await);
        });
        self.tx.send(job).map_err(|_| PaapiError::DispatcherClosed)?;
        done_rx.await.map_err(|_| PaapiError::DispatcherClosed)
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Job>,
    min_interval: Duration,
    dispatched: Arc<AtomicU64>,
) {
    let mut last_dispatch: Option<Instant> = None;

    while let Some(job) = rx.recv().await {
        if let Some(last) = last_dispatch {
            let ready_at = last + min_interval;
            if ready_at > Instant::now() {
                debug!("Rate limiting: waiting {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }
        last_dispatch = Some(Instant::now());
        dispatched.fetch_add(1, Ordering::Relaxed);
        job.await;
    }

    debug!("Dispatcher queue closed");
}
