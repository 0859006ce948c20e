#![doc = include_str!("../README.md")]

mod error;
mod pipeline;
mod queue;
mod request;
mod scheduler;
mod sequencer;
mod stats;
mod store;
mod worker;

pub use error::{Error, Result};
pub use pipeline::{
    DEFAULT_HASH_DELAY, DEFAULT_QUEUE_CAPACITY, HashPipeline, PipelineConfig, PipelineState,
    parse_id,
};
pub use queue::WorkQueue;
pub use request::HashRequest;
pub use scheduler::DeferredScheduler;
pub use sequencer::Sequencer;
pub use stats::{StatsCollector, StatsSnapshot};
pub use store::{DIGEST_SIZE, Digest, ResultStore};
pub use worker::hash_worker_loop;
