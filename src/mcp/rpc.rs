//! JSON-RPC response construction utilities
//!
//! Provides standard error codes and the mapping of parameter errors to JSON-RPC payloads.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, Result as McpResult, RpcError,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::protocol::{Reply, RequestId};

pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Rejected request parameters, reported as `Invalid params` with a machine-readable code.
#[derive(Debug, Error)]
#[error("invalid params: {message}")]
pub struct ParamsError {
    pub code: &'static str,
    pub message: &'static str,
}

impl ParamsError {
    pub fn new(code: &'static str, message: &'static str) -> Self {
        Self { code, message }
    }

    pub fn into_json_rpc(self, id: RequestId) -> Reply {
        json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": self.code,
                "message": self.message,
                "details": {}
            })),
        )
    }
}

pub fn json_rpc_error(id: RequestId, code: i64, message: &str) -> Reply {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: RequestId,
    code: i64,
    message: &str,
    data: Option<Value>,
) -> Reply {
    Reply::Error(JsonrpcErrorResponse::new(
        RpcError {
            code,
            data,
            message: message.to_string(),
        },
        Some(id),
    ))
}

/// Results must be JSON objects; anything else is reported as `Internal error`.
pub fn json_rpc_result(id: RequestId, result: Value) -> Reply {
    match result {
        Value::Object(extra) => Reply::Result(JsonrpcResultResponse::new(
            id,
            McpResult {
                meta: None,
                extra: Some(extra),
            },
        )),
        other => {
            error!(result = %other, "result is not a JSON object");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

/// Serializes an SDK schema result; a failure becomes an `Internal error` reply.
pub fn schema_result<T: Serialize>(id: RequestId, result: &T) -> Reply {
    match serde_json::to_value(result) {
        Ok(value) => json_rpc_result(id, value),
        Err(err) => {
            error!(error = %err, "failed to serialize result");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}
