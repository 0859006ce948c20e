//! axum router and request handlers.
//!
//! The handlers are thin: they parse the wire format, delegate to
//! [`HashPipeline`], and map core errors onto HTTP status codes. All
//! concurrency coordination lives in `digestif-core`.

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use axum::routing::{any, get, post};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use digestif_core::{Error, HashPipeline, StatsSnapshot, parse_id};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: HashPipeline,
    shutdown: CancellationToken,
}

/// Builds the application router.
///
/// Cancelling `shutdown` (from the `/shutdown` route or a signal) makes the
/// serve loop stop accepting connections; the pipeline drain runs afterwards
/// in `main`.
pub fn router(pipeline: HashPipeline, shutdown: CancellationToken) -> Router {
    Router::new()
        .route("/hash", post(admit_hash))
        .route("/hash/{id}", get(get_hash))
        .route("/stats", get(get_stats))
        .route("/shutdown", any(request_shutdown))
        .with_state(AppState { pipeline, shutdown })
}

/// Form body for `POST /hash`. The field name is part of the original wire
/// contract.
#[derive(Debug, Deserialize)]
struct HashSubmission {
    password: Option<String>,
}

/// `POST /hash` — admit a payload for deferred hashing.
///
/// Responds `202 Accepted` with the decimal id; the digest becomes available
/// via `GET /hash/{id}` once the delay elapses.
async fn admit_hash(
    State(state): State<AppState>,
    Form(submission): Form<HashSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = submission.password.unwrap_or_default().into_bytes();
    let id = state.pipeline.admit(payload)?;
    Ok((StatusCode::ACCEPTED, id.to_string()))
}

/// `GET /hash/{id}` — fetch the base64 digest for an admitted request.
async fn get_hash(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&raw_id)?;
    let digest = state.pipeline.lookup(id)?;
    Ok(BASE64.encode(digest))
}

/// `GET /stats` — aggregate admission statistics.
async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.pipeline.stats())
}

/// `/shutdown` — acknowledge immediately and let draining proceed in the
/// background. Idempotent: cancelling an already-cancelled token is a no-op.
async fn request_shutdown(State(state): State<AppState>) -> StatusCode {
    tracing::info!("shutdown requested over HTTP");
    state.shutdown.cancel();
    StatusCode::ACCEPTED
}

/// Wrapper mapping core errors onto HTTP responses, in the spirit of the
/// original server: client mistakes (bad payload, malformed id, digest not
/// yet available) are all `400`, refused admissions during shutdown are
/// `503`, internal faults are `500`.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidPayload { .. } | Error::InvalidId { .. } | Error::NotFound { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
            Error::ChannelError { .. } => {
                tracing::error!(error = %self.0, "internal pipeline fault");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.0.to_string()).into_response()
    }
}
