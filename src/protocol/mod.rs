//! JSON-RPC wire protocol for the Model Context Protocol
//!
//! Provides the typed message model and the byte-level codec used by every transport.

pub mod codec;
pub mod message;

pub use codec::{decode, encode, CodecError};
pub use message::{
    Message, Notification, Reply, Request, RequestId, Response, RpcError, JSONRPC_VERSION,
};
