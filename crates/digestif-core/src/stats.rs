use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Aggregate processing statistics since pipeline start.
///
/// `processed_count` counts *admissions*, not completions: it is incremented
/// the moment a request is accepted, before any hashing happens. The average
/// divides total elapsed wall-clock time by that count, which makes it an
/// inverse admission rate rather than a per-request latency distribution.
/// The original service shipped with exactly this semantic and callers may
/// depend on it, so it is preserved verbatim.
#[derive(Debug)]
pub struct StatsCollector {
    processed: AtomicU64,
    started_at: Instant,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the collector, serialized with the original wire
/// field names (`total` / `average`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Number of admitted requests since start.
    #[serde(rename = "total")]
    pub processed_count: u64,
    /// Elapsed milliseconds since start divided by `processed_count`,
    /// truncated toward zero; 0 while nothing has been admitted.
    #[serde(rename = "average")]
    pub average_latency_ms: u64,
}

impl StatsCollector {
    /// Creates a collector whose clock starts now.
    pub fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Records one accepted admission. Called once per successful `admit`.
    pub fn record_admission(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Computes the current snapshot without blocking admissions.
    pub fn snapshot(&self) -> StatsSnapshot {
        let processed_count = self.processed.load(Ordering::Relaxed);
        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        let average_latency_ms = if processed_count == 0 {
            0
        } else {
            elapsed_ms / processed_count
        };

        StatsSnapshot {
            processed_count,
            average_latency_ms,
        }
    }
}
