//! Pipeline facade and lifecycle controller.
//!
//! [`HashPipeline`] wires the sequencer, deferred scheduler, work queue,
//! hash worker, result store, and stats collector together and owns the
//! `Running -> Draining -> Stopped` state machine. The transport layer talks
//! to the pipeline exclusively through [`admit`], [`lookup`], [`stats`], and
//! [`shutdown`].
//!
//! [`admit`]: HashPipeline::admit
//! [`lookup`]: HashPipeline::lookup
//! [`stats`]: HashPipeline::stats
//! [`shutdown`]: HashPipeline::shutdown

use crate::{
    DeferredScheduler, Digest, Error, HashRequest, Result, ResultStore, Sequencer, StatsCollector,
    StatsSnapshot, WorkQueue, hash_worker_loop,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

/// Default hold window between admission and hashing.
pub const DEFAULT_HASH_DELAY: Duration = Duration::from_secs(5);

/// Default capacity of the bounded work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Lifecycle states, in the only order they can be traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Admissions, lookups, and stats all accepted; worker active.
    Running = 0,
    /// Admissions refused; previously accepted work completing.
    Draining = 1,
    /// Worker terminated. Lookups and stats remain valid: the result store
    /// lives for the rest of the process.
    Stopped = 2,
}

impl PipelineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// Tunables for a [`HashPipeline`].
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// How long each admitted request is held before becoming eligible for
    /// hashing.
    pub hash_delay: Duration,
    /// Bounded work queue capacity. Must be non-zero.
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hash_delay: DEFAULT_HASH_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// The deferred hashing pipeline.
///
/// Cheap to clone; all clones share the same underlying components. Creating
/// a pipeline spawns its single hash worker, so construction must happen
/// inside a tokio runtime.
#[derive(Clone)]
pub struct HashPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    sequencer: Sequencer,
    scheduler: Arc<DeferredScheduler>,
    queue: Arc<WorkQueue>,
    store: Arc<ResultStore>,
    stats: StatsCollector,
    state: AtomicU8,
    /// Serializes admissions against the `Running -> Draining` edge: an
    /// admission holds the read side across its state check and release
    /// registration, shutdown flips the state under the write side. Without
    /// it, an admission could observe `Running`, lose the race to a
    /// completed drain, and schedule a request onto a closed queue.
    admission_gate: RwLock<()>,
    worker_done: Mutex<Option<oneshot::Receiver<()>>>,
}

impl HashPipeline {
    /// Builds the pipeline and spawns the hash worker.
    pub fn new(config: PipelineConfig) -> Self {
        let store = Arc::new(ResultStore::new());
        let (queue, work_rx) = WorkQueue::bounded(config.queue_capacity);
        let queue = Arc::new(queue);
        let scheduler = Arc::new(DeferredScheduler::new(
            config.hash_delay,
            Arc::clone(&queue),
        ));

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(hash_worker_loop(work_rx, Arc::clone(&store), done_tx));

        Self {
            inner: Arc::new(PipelineInner {
                sequencer: Sequencer::new(),
                scheduler,
                queue,
                store,
                stats: StatsCollector::new(),
                state: AtomicU8::new(PipelineState::Running as u8),
                admission_gate: RwLock::new(()),
                worker_done: Mutex::new(Some(done_rx)),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Admits a payload for deferred hashing.
    ///
    /// Synchronously assigns the next id, records the admission, and arms the
    /// delay timer; hashing happens asynchronously no sooner than the
    /// configured delay. Never blocks on the queue or the worker.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPayload`] if `payload` is empty, or
    /// [`Error::ServiceShutdown`] once shutdown has begun. Rejected requests
    /// never enter the pipeline and are not counted.
    pub fn admit(&self, payload: Vec<u8>) -> Result<u64> {
        // Held across check-then-schedule so a concurrent shutdown cannot
        // complete its drain between the state read and the release
        // registration; see `admission_gate`.
        let _gate = self.inner.admission_gate.read();

        if self.state() != PipelineState::Running {
            return Err(Error::ServiceShutdown);
        }
        if payload.is_empty() {
            return Err(Error::InvalidPayload {
                reason: "payload must not be empty".to_string(),
            });
        }

        let id = self.inner.sequencer.next_id();
        self.inner.stats.record_admission();
        self.inner.scheduler.schedule(HashRequest { id, payload });
        tracing::trace!(id, "admission scheduled");
        Ok(id)
    }

    /// Returns the digest for `id`.
    ///
    /// Valid in every lifecycle state, including [`PipelineState::Stopped`].
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no digest has been stored for `id` yet (or
    /// ever).
    pub fn lookup(&self, id: u64) -> Result<Digest> {
        self.inner.store.get(id).ok_or(Error::NotFound { id })
    }

    /// Current aggregate statistics. Never fails and never blocks admissions.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Number of releases still held by the deferred scheduler.
    pub fn pending_count(&self) -> usize {
        self.inner.scheduler.pending_count()
    }

    /// Drives the `Running -> Draining -> Stopped` transition.
    ///
    /// Idempotent: the first caller performs the drain; later callers (and
    /// callers racing the first) return immediately while draining proceeds.
    /// No request admitted before this call is dropped and no digest is
    /// computed twice.
    pub async fn shutdown(&self) {
        {
            // Exclusive gate: admissions that already observed `Running`
            // finish registering their release before the state flips, so
            // the drain below accounts for every accepted request.
            let _gate = self.inner.admission_gate.write();

            // Only one caller wins the Running -> Draining edge.
            if self
                .inner
                .state
                .compare_exchange(
                    PipelineState::Running as u8,
                    PipelineState::Draining as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                tracing::debug!("shutdown already in progress or complete");
                return;
            }
        }

        tracing::info!("refusing new admissions");
        tracing::info!(
            pending = self.inner.scheduler.pending_count(),
            "draining deferred releases"
        );
        self.inner.scheduler.drain().await;

        tracing::debug!("closing work queue");
        self.inner.queue.close();

        let done = self.inner.worker_done.lock().take();
        if let Some(done) = done {
            if done.await.is_err() {
                tracing::error!("hash worker exited without acknowledging shutdown");
            }
        }

        self.inner
            .state
            .store(PipelineState::Stopped as u8, Ordering::Release);
        tracing::info!(
            digests = self.inner.store.len(),
            "pipeline stopped"
        );
    }
}

/// Parses a lookup key from its textual route form.
///
/// # Errors
///
/// [`Error::InvalidId`] when `raw` is not a well-formed non-negative integer.
pub fn parse_id(raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|_| Error::InvalidId {
        input: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_non_negative_integers() {
        assert_eq!(parse_id("0").unwrap(), 0);
        assert_eq!(parse_id("42").unwrap(), 42);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        for raw in ["abc", "-1", "1.5", "", " 1"] {
            assert!(matches!(
                parse_id(raw).unwrap_err(),
                Error::InvalidId { .. }
            ));
        }
    }
}
