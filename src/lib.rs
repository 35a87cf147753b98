use std::{sync::Arc, time::Duration};

use axum::{
    middleware,
    routing::{any, get},
    Router,
};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod protocol;
pub mod transport;

use http::stateless::{fresh_server_factory, shared_server_factory, ServerFactory};
use mcp::McpServer;

#[derive(Clone)]
pub struct AppState {
    pub request_timeout: Option<Duration>,
    pub stateless_factory: Arc<dyn ServerFactory>,
    pub shared_factory: Arc<dyn ServerFactory>,
}

impl AppState {
    pub fn new(request_timeout: Option<Duration>, shared_server: Arc<McpServer>) -> Self {
        Self::with_factories(
            request_timeout,
            fresh_server_factory(),
            shared_server_factory(shared_server),
        )
    }

    pub fn with_factories(
        request_timeout: Option<Duration>,
        stateless_factory: Arc<dyn ServerFactory>,
        shared_factory: Arc<dyn ServerFactory>,
    ) -> Self {
        Self {
            request_timeout,
            stateless_factory,
            shared_factory,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/readiness", get(http::handlers::readiness))
        .route("/mcp-stateless", any(http::stateless::mcp_stateless))
        .route("/mcp-shared", any(http::stateless::mcp_shared))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
