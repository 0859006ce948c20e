use crate::{Digest, HashRequest, ResultStore};
use sha2::{Digest as _, Sha512};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Long-lived worker task that drains the work queue and computes digests.
///
/// Pops requests until the queue reports closed-and-empty, hashing each
/// payload with SHA-512 and writing the result into the store. Designed to be
/// spawned exactly once per pipeline; a single worker keeps digest
/// availability ordered with queue arrival, and hashing is cheap relative to
/// the artificial admission delay.
///
/// On exit the worker signals completion over `done` so the lifecycle
/// controller can finish its `Draining -> Stopped` transition.
pub async fn hash_worker_loop(
    mut rx: mpsc::Receiver<HashRequest>,
    store: Arc<ResultStore>,
    done: oneshot::Sender<()>,
) {
    tracing::trace!("hash worker started");

    while let Some(request) = rx.recv().await {
        let digest: Digest = Sha512::digest(&request.payload).into();
        if store.put(request.id, digest) {
            tracing::debug!(id = request.id, "digest stored");
        } else {
            tracing::warn!(id = request.id, "digest already present, skipping");
        }
    }

    tracing::trace!("hash worker stopped");
    if done.send(()).is_err() {
        tracing::debug!("no listener for worker completion signal");
    }
}
