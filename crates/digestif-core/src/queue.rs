use crate::{Error, HashRequest, Result};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Bounded FIFO buffer between the deferred scheduler and the hash worker.
///
/// Backed by a bounded [`mpsc`] channel: [`push`](Self::push) awaits when the
/// buffer is full (backpressure, never drops), and the consumer side blocks
/// when empty until an item arrives or the queue is closed. FIFO ordering of
/// items that actually reach the queue is the only ordering guarantee.
///
/// [`close`](Self::close) is idempotent and only stops *future* pushes;
/// items already buffered remain poppable, so the consumer observes
/// closed-and-empty exactly once the backlog is drained (`recv()` returning
/// `None`). Closing while producers are still mid-push is a usage error the
/// lifecycle controller avoids by draining the scheduler first.
#[derive(Debug)]
pub struct WorkQueue {
    sender: Mutex<Option<mpsc::Sender<HashRequest>>>,
}

impl WorkQueue {
    /// Creates a queue with room for `capacity` requests and returns the
    /// consumer end alongside it.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 (a zero-capacity mpsc channel is invalid).
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<HashRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Enqueues a request, awaiting while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] if the queue was closed before the
    /// push began, or [`Error::ChannelError`] if the consumer vanished.
    pub async fn push(&self, request: HashRequest) -> Result<()> {
        // Clone the sender out so the lock is not held across the await.
        let sender = self.sender.lock().clone();
        let Some(sender) = sender else {
            return Err(Error::ServiceShutdown);
        };
        sender.send(request).await.map_err(|e| Error::ChannelError {
            context: format!("work queue receiver dropped (id {})", e.0.id),
        })
    }

    /// Closes the queue to further pushes. Idempotent.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}
