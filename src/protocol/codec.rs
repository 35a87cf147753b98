//! Byte-level codec for single JSON-RPC messages
//!
//! Message kind is decided structurally: an object carrying `method` is a request (or a
//! notification when it has no `id`), anything else is decoded as a response. Batches are
//! not supported.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::message::{Message, Notification, Request, RequestId, Response};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct MethodBearing {
    #[serde(default)]
    jsonrpc: String,
    #[serde(default)]
    id: Option<RequestId>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

pub fn decode(payload: &[u8]) -> Result<Message, CodecError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|err| CodecError::MalformedPayload(format!("invalid JSON: {err}")))?;

    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) => {
            return Err(CodecError::MalformedPayload(
                "batched messages are not supported".to_string(),
            ))
        }
        other => {
            return Err(CodecError::MalformedPayload(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )))
        }
    };

    if object.contains_key("method") {
        let parsed: MethodBearing = serde_json::from_value(Value::Object(object))
            .map_err(|err| CodecError::MalformedPayload(format!("invalid request: {err}")))?;

        return Ok(match parsed.id {
            Some(id) => Message::Request(Request {
                jsonrpc: parsed.jsonrpc,
                id,
                method: parsed.method,
                params: parsed.params,
            }),
            None => Message::Notification(Notification {
                jsonrpc: parsed.jsonrpc,
                method: parsed.method,
                params: parsed.params,
            }),
        });
    }

    serde_json::from_value::<Response>(Value::Object(object))
        .map(Message::Response)
        .map_err(|err| CodecError::MalformedPayload(format!("invalid response: {err}")))
}

pub fn encode(message: &Message) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(message)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
