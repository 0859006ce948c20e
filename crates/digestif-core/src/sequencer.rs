use std::sync::atomic::{AtomicU64, Ordering};

/// A lock-free issuer of unique, monotonically increasing request ids.
///
/// Ids start at 1 and are handed out via a single atomic increment, so any
/// number of concurrent callers observe no lost or duplicate values. There
/// are no error conditions and ids are never reused.
#[derive(Debug, Default)]
pub struct Sequencer {
    issued: AtomicU64,
}

impl Sequencer {
    /// Creates a sequencer whose first issued id is 1.
    pub const fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
        }
    }

    /// Atomically reserves and returns the next id.
    pub fn next_id(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of ids issued so far.
    pub(crate) fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
