//! Stateless Streamable HTTP adapter
//!
//! Bridges one HTTP exchange to one JSON-RPC exchange. Unlike a session-based streamable
//! HTTP endpoint, no session is created, no `Mcp-Session-Id` header is issued, and the reply
//! is plain JSON rather than an SSE stream. Every request is processed independently.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::mcp::{McpServer, ServerError};
use crate::protocol::codec;
use crate::transport::{ReplySlot, StatelessTransport, TransportError};
use crate::AppState;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Same ceiling as axum's default body limit.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Runs one stateless exchange to completion against its transport.
#[async_trait]
pub trait ExchangeRuntime: Send + Sync {
    async fn execute(&self, transport: StatelessTransport) -> Result<(), ServerError>;
}

#[async_trait]
impl ExchangeRuntime for McpServer {
    async fn execute(&self, transport: StatelessTransport) -> Result<(), ServerError> {
        self.run(transport).await
    }
}

/// Supplies the runtime that handles one HTTP request.
pub trait ServerFactory: Send + Sync {
    fn server_for(&self, request: &Parts) -> Option<Arc<dyn ExchangeRuntime>>;
}

impl<F> ServerFactory for F
where
    F: Fn(&Parts) -> Option<Arc<dyn ExchangeRuntime>> + Send + Sync,
{
    fn server_for(&self, request: &Parts) -> Option<Arc<dyn ExchangeRuntime>> {
        self(request)
    }
}

/// Builds a fresh server for every request.
pub fn fresh_server_factory() -> Arc<dyn ServerFactory> {
    Arc::new(|request: &Parts| -> Option<Arc<dyn ExchangeRuntime>> {
        info!(
            method = %request.method,
            path = %request.uri.path(),
            "creating MCP server instance for stateless request"
        );
        Some(Arc::new(McpServer::new()))
    })
}

/// Hands out the same server instance to every request.
pub fn shared_server_factory(server: Arc<McpServer>) -> Arc<dyn ServerFactory> {
    Arc::new(move |request: &Parts| -> Option<Arc<dyn ExchangeRuntime>> {
        let request_id = request
            .headers
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        info!(request_id, "reusing shared MCP server instance");
        Some(server.clone())
    })
}

pub async fn mcp_stateless(State(state): State<AppState>, request: Request) -> Response {
    handle_exchange(state.stateless_factory.as_ref(), state.request_timeout, request)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

pub async fn mcp_shared(State(state): State<AppState>, request: Request) -> Response {
    handle_exchange(state.shared_factory.as_ref(), state.request_timeout, request)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

pub async fn handle_exchange(
    factory: &dyn ServerFactory,
    request_timeout: Option<Duration>,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();

    if parts.method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    if !accepts_json(&parts.headers) {
        return Err(AppError::NotAcceptable);
    }

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|err| AppError::bad_request(format!("Failed to read request body: {err}")))?;

    let message = codec::decode(&body)
        .map_err(|err| AppError::bad_request(format!("Invalid JSON-RPC message: {err}")))?;

    let server = factory
        .server_for(&parts)
        .ok_or(AppError::NoServerInstance)?;

    let reply = ReplySlot::default();
    let transport = StatelessTransport::new(message, reply.clone());
    let run = server.execute(transport);
    let outcome = match request_timeout {
        Some(limit) => tokio::time::timeout(limit, run).await.ok(),
        None => Some(run.await),
    };

    match outcome {
        Some(Ok(())) => Ok(reply
            .take()
            .unwrap_or_else(|| StatusCode::ACCEPTED.into_response())),
        Some(Err(err)) => match reply.take() {
            Some(response) => {
                log_late_failure(&err);
                Ok(response)
            }
            None => Err(match err {
                ServerError::InvalidMessage(message) => {
                    AppError::bad_request(format!("Invalid JSON-RPC message: {message}"))
                }
                other => AppError::internal(other.to_string()),
            }),
        },
        None => match reply.take() {
            Some(response) => Ok(response),
            None => Err(AppError::internal("request timed out before a reply was written")),
        },
    }
}

/// A missing header, an empty header, the JSON media type or a wildcard are all acceptable.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let mut values = headers.get_all(header::ACCEPT).iter().peekable();
    if values.peek().is_none() {
        return true;
    }

    values.filter_map(|value| value.to_str().ok()).any(|accept| {
        accept.trim().is_empty() || accept.contains(JSON_CONTENT_TYPE) || accept.contains("*/*")
    })
}

// The client already holds a valid reply; the failure is only reported to operators.
fn log_late_failure(err: &ServerError) {
    match err {
        ServerError::Transport(TransportError::ResponseAlreadySent) => {
            error!(error = %err, "runtime attempted a second reply on a stateless exchange")
        }
        _ => warn!(error = %err, "runtime failed after the reply was written"),
    }
}
