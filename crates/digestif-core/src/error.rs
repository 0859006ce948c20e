//! Error types for the deferred hashing pipeline.
//!
//! This module defines the central `Error` enum, which captures all
//! reportable error cases within the pipeline. The transport crate maps these
//! onto HTTP responses; nothing in here knows about status codes.
//!
//! ## Error Cases
//! - `InvalidPayload`: The admission payload was missing or empty; the
//!   request never enters the pipeline.
//! - `InvalidId`: A lookup key was not a well-formed non-negative integer.
//! - `NotFound`: No digest exists (yet) for the requested id.
//! - `ChannelError`: An internal communication failure between tasks.
//! - `ServiceShutdown`: An admission arrived while the pipeline was draining
//!   or stopped.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the deferred hashing pipeline.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The admission payload was missing or empty.
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    /// The lookup key could not be parsed as a non-negative integer.
    #[error("Invalid hash id {input:?}: must be a non-negative integer")]
    InvalidId { input: String },

    /// No digest has been stored for this id.
    #[error("No digest exists for hash id {id}")]
    NotFound { id: u64 },

    /// Internal channel send/receive failure (e.g., closed channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The pipeline is draining or stopped and refuses new admissions.
    #[error("Service is shutting down")]
    ServiceShutdown,
}
