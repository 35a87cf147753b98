//! Tracing subscriber setup and per-request HTTP logging
//!
//! Every request runs inside an `http_request` span, so events emitted by the adapter and
//! the MCP runtime carry its method, path and request id.

use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, info_span, warn, Instrument};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
const REQUEST_ID_HEADER: &str = "x-request-id";

pub type LoggingInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() -> Result<(), LoggingInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Completed,
    Rejected,
    Failed,
}

impl From<StatusCode> for RequestOutcome {
    fn from(status: StatusCode) -> Self {
        if status.is_server_error() {
            Self::Failed
        } else if status.is_client_error() {
            Self::Rejected
        } else {
            Self::Completed
        }
    }
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let span = info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = request_id(request.headers()),
    );
    let started_at = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| log_outcome(response.status(), started_at.elapsed()));
    response
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("-")
}

fn log_outcome(status: StatusCode, elapsed: Duration) {
    let status_code = status.as_u16();
    let duration_ms = elapsed.as_millis();

    match RequestOutcome::from(status) {
        RequestOutcome::Completed => {
            info!(status = status_code, duration_ms, "request completed")
        }
        RequestOutcome::Rejected => warn!(status = status_code, duration_ms, "request rejected"),
        RequestOutcome::Failed => error!(status = status_code, duration_ms, "request failed"),
    }
}
