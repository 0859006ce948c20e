use parking_lot::RwLock;
use std::collections::HashMap;

/// The number of bytes in a stored digest (SHA-512 output).
pub const DIGEST_SIZE: usize = 64;

/// A fixed-length SHA-512 digest of an admitted payload.
pub type Digest = [u8; DIGEST_SIZE];

/// Thread-safe mapping from request id to computed digest.
///
/// Reads take a shared lock so any number of lookups proceed in parallel; a
/// write excludes all readers and writers for its (brief) duration. Once a
/// digest has been written for an id it is never overwritten, which keeps the
/// "one request, one digest" invariant even if a duplicate write were ever
/// attempted.
#[derive(Debug, Default)]
pub struct ResultStore {
    digests: RwLock<HashMap<u64, Digest>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `digest` for `id`. Returns `false` (and leaves the existing
    /// entry untouched) if a digest was already present.
    pub fn put(&self, id: u64, digest: Digest) -> bool {
        let mut digests = self.digests.write();
        match digests.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(digest);
                true
            }
        }
    }

    /// Returns the digest for `id`, if processing has completed.
    pub fn get(&self, id: u64) -> Option<Digest> {
        self.digests.read().get(&id).copied()
    }

    /// Number of digests stored so far.
    pub fn len(&self) -> usize {
        self.digests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.read().is_empty()
    }
}
