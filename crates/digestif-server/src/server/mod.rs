//! HTTP server wiring around the core pipeline.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env argument parsing and validation.
//! - [`routes`] - axum router and request handlers.
//! - [`telemetry`] - tracing subscriber initialization.

pub mod config;
pub mod routes;
pub mod telemetry;
