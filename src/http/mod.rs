//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the readiness probe and the stateless MCP endpoints.

pub mod handlers;
pub mod stateless;
