/// A hashing request travelling from admission to the worker.
///
/// Created once at admission time with a [`Sequencer`]-issued id, held by the
/// deferred scheduler for the delay window, then consumed exactly once by the
/// hash worker. Not retained after its digest is stored.
///
/// [`Sequencer`]: crate::Sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRequest {
    /// Unique, monotonically increasing admission id.
    pub id: u64,
    /// The secret bytes to digest. Never empty: admission validates this.
    pub payload: Vec<u8>,
}
