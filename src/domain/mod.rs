//! Tool implementations exposed over the MCP protocol

pub mod tools;
