//! Axum HTTP handlers outside the MCP exchange

pub async fn readiness() -> &'static str {
    "OK"
}
