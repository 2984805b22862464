//! Outbound request queue with batched, idempotent draining.
//!
//! [`RequestQueue::enqueue`] always accepts. Accepted requests are released
//! in batches of `batch_size`: every item in a batch passes through the
//! [`RateGovernor`] concurrently, and the drainer pauses `batch_yield` between
//! batches while work remains. A single `draining` flag, guarded together with
//! the pending list, keeps at most one drainer alive so no request is
//! admitted twice.
//!
//! # Example
//!
//! ```rust,ignore
//! let queue = RequestQueue::new(QueueConfig::default(), governor);
//! let spec = queue.enqueue(RequestSpec::get("/movie/popular")).admitted().await?;
//! // `spec` may now be handed to the transport.
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use reelgate_core::{Error, RequestSpec, Result};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{debug, trace};

use super::governor::RateGovernor;
use crate::config::QueueConfig;

/// One pending call, owned by the queue until admitted.
#[derive(Debug)]
pub struct QueuedRequest {
    pub spec: RequestSpec,
    on_admit: oneshot::Sender<RequestSpec>,
}

/// Completion handle returned by [`RequestQueue::enqueue`].
#[derive(Debug)]
pub struct Admission {
    rx: oneshot::Receiver<RequestSpec>,
}

impl Admission {
    /// Wait until the governor clears the request, returning it for dispatch.
    ///
    /// Fails only if the admission task died before settling.
    pub async fn admitted(self) -> Result<RequestSpec> {
        self.rx
            .await
            .map_err(|_| Error::Internal("request admission was abandoned".into()))
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedRequest>,
    draining: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,
    governor: Arc<RateGovernor>,
    config: QueueConfig,
}

/// Handle to the shared queue. Cheap to clone.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<QueueInner>,
}

impl RequestQueue {
    pub fn new(config: QueueConfig, governor: Arc<RateGovernor>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                governor,
                config,
            }),
        }
    }

    /// Accept `spec` and make sure a drainer is running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue(&self, spec: RequestSpec) -> Admission {
        let (tx, rx) = oneshot::channel();
        let start_drain = {
            let mut state = self.inner.state.lock();
            state.pending.push_back(QueuedRequest { spec, on_admit: tx });
            trace!(pending = state.pending.len(), "Request enqueued");
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if start_drain {
            tokio::spawn(drain(self.inner.clone()));
        }

        Admission { rx }
    }

    /// Number of requests waiting for a batch slot.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn is_draining(&self) -> bool {
        self.inner.state.lock().draining
    }
}

/// Release batches until the pending list is empty, then clear the flag.
async fn drain(inner: Arc<QueueInner>) {
    let batch_size = inner.config.batch_size.max(1);
    let mut round = 0u64;

    loop {
        let batch: Vec<QueuedRequest> = {
            let mut state = inner.state.lock();
            let take = batch_size.min(state.pending.len());
            state.pending.drain(..take).collect()
        };
        round += 1;
        debug!(round, batch = batch.len(), "Releasing request batch");

        for item in batch {
            let governor = inner.governor.clone();
            tokio::spawn(async move {
                governor.admit().await;
                if item.on_admit.send(item.spec).is_err() {
                    trace!("Caller dropped before admission");
                }
            });
        }

        {
            let mut state = inner.state.lock();
            if state.pending.is_empty() {
                state.draining = false;
                return;
            }
        }

        sleep(inner.config.batch_yield()).await;
    }
}
