//! Model Context Protocol (MCP) server runtime
//!
//! Reads messages from any [`crate::transport::Transport`], routes requests to their
//! handlers and writes one reply per request.

pub mod rpc;
pub mod server;

pub use server::{McpServer, ServerError};
