use crate::{HashRequest, WorkQueue};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Holds admitted requests for a fixed delay window before releasing them to
/// the work queue.
///
/// [`schedule`](Self::schedule) registers one pending release, arms a timer
/// task, and returns immediately, so the admission path never blocks on
/// hashing. Every armed timer is accounted against a counting barrier
/// (`pending` + [`Notify`]): [`drain`](Self::drain) blocks until all timers
/// armed before the call have fired *and* enqueued their request, which is
/// what lets shutdown wait deterministically for in-flight work.
///
/// Known hazard, accepted by design: if the work queue is full, the
/// timer-fire path blocks on [`WorkQueue::push`]. That backpressure can stall
/// `drain` for as long as the worker is stuck, but it guarantees no admitted
/// request is ever dropped.
#[derive(Debug)]
pub struct DeferredScheduler {
    delay: Duration,
    queue: Arc<WorkQueue>,
    pending: AtomicUsize,
    drained: Notify,
}

impl DeferredScheduler {
    pub fn new(delay: Duration, queue: Arc<WorkQueue>) -> Self {
        Self {
            delay,
            queue,
            pending: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Number of releases still pending (timers armed but not yet enqueued).
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Registers a pending release and arms a timer for the configured delay.
    /// Returns immediately; the request reaches the work queue no sooner than
    /// `delay` from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(self: &Arc<Self>, request: HashRequest) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let scheduler = Arc::clone(self);

        tokio::spawn(async move {
            tokio::time::sleep(scheduler.delay).await;

            let id = request.id;
            if let Err(error) = scheduler.queue.push(request).await {
                // Only reachable if the queue was closed before this timer
                // fired, which the lifecycle controller rules out by draining
                // before closing. The release is still deregistered so drain
                // cannot hang on a lost request.
                tracing::error!(id, %error, "failed to enqueue deferred request");
            } else {
                tracing::trace!(id, "deferred request released to work queue");
            }

            if scheduler.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                scheduler.drained.notify_waiters();
            }
        });
    }

    /// Waits until every timer armed before this call has fired and enqueued
    /// its request. Returns immediately when nothing is pending.
    pub async fn drain(&self) {
        loop {
            // Register interest before re-checking to avoid a missed wakeup
            // between the load and the await.
            let drained = self.drained.notified();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            drained.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: u64) -> HashRequest {
        HashRequest {
            id,
            payload: b"secret".to_vec(),
        }
    }

    fn scheduler(delay_ms: u64, capacity: usize) -> (Arc<DeferredScheduler>, tokio::sync::mpsc::Receiver<HashRequest>) {
        let (queue, rx) = WorkQueue::bounded(capacity);
        (
            Arc::new(DeferredScheduler::new(
                Duration::from_millis(delay_ms),
                Arc::new(queue),
            )),
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn holds_request_for_the_delay_window() {
        let (scheduler, mut rx) = scheduler(5_000, 8);
        scheduler.schedule(request(1));
        assert_eq!(scheduler.pending_count(), 1);
        // Let the timer task register its sleep before advancing the clock.
        tokio::task::yield_now().await;

        // Nothing is released before the window elapses.
        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(rx.try_recv().unwrap().id, 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_all_armed_timers() {
        let (scheduler, mut rx) = scheduler(100, 8);
        for id in 1..=5 {
            scheduler.schedule(request(id));
        }
        assert_eq!(scheduler.pending_count(), 5);

        scheduler.drain().await;
        assert_eq!(scheduler.pending_count(), 0);
        for _ in 0..5 {
            assert!(rx.try_recv().is_ok());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drain_returns_immediately_when_idle() {
        let (scheduler, _rx) = scheduler(100, 8);
        scheduler.drain().await;
    }
}
