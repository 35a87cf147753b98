//! Typed JSON-RPC 2.0 messages
//!
//! A message is one of a request (has `id` and `method`), a notification (has `method`
//! only) or a response (has `id` and one of `result` / `error`). Inbound responses are kept
//! in a lenient shape so malformed ones can be rejected by the runtime rather than the codec;
//! outbound replies are the SDK's JSON-RPC envelopes.

use rust_mcp_sdk::schema::{JsonrpcErrorResponse, JsonrpcResultResponse};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use rust_mcp_sdk::schema::{RequestId, RpcError};

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A response received from the peer. Every field may be missing, so `{}` still decodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    /// Exactly one of `result` and `error` must be present.
    pub fn is_well_formed(&self) -> bool {
        self.result.is_some() != self.error.is_some()
    }
}

/// A reply produced by this server for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Result(JsonrpcResultResponse),
    Error(JsonrpcErrorResponse),
}

impl Reply {
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Result(response) => Some(&response.id),
            Self::Error(response) => response.id.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match self {
            Self::Result(_) => None,
            Self::Error(response) => Some(&response.error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Notification(Notification),
    Response(Response),
    Reply(Reply),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Notification(_) => "notification",
            Self::Response(_) => "response",
            Self::Reply(Reply::Result(_)) => "result",
            Self::Reply(Reply::Error(_)) => "error",
        }
    }
}

impl From<Reply> for Message {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}

// A present `"result": null` is a valid result, not an absent one.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use rust_mcp_sdk::schema::Result as McpResult;
    use serde_json::json;

    use super::*;

    #[test]
    fn null_result_counts_as_present() {
        let response: Response =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 4, "result": null}))
                .expect("deserialize response");

        assert_eq!(response.result, Some(Value::Null));
        assert!(response.is_well_formed());
    }

    #[test]
    fn response_with_both_outcomes_is_not_well_formed() {
        let response: Response = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": "a",
            "result": {},
            "error": { "code": 1, "message": "boom" }
        }))
        .expect("deserialize response");

        assert!(!response.is_well_formed());
    }

    #[test]
    fn error_reply_serializes_as_json_rpc_error() {
        let reply = Reply::Error(JsonrpcErrorResponse::new(
            RpcError {
                code: -32600,
                message: "Invalid Request".to_string(),
                data: None,
            },
            Some(RequestId::String("r-1".to_string())),
        ));

        assert!(matches!(reply.id(), Some(RequestId::String(id)) if id == "r-1"));
        assert_eq!(reply.error().map(|error| error.code), Some(-32600));
        assert_eq!(
            serde_json::to_value(Message::from(reply)).expect("serialize reply"),
            json!({
                "jsonrpc": "2.0",
                "id": "r-1",
                "error": { "code": -32600, "message": "Invalid Request" }
            })
        );
    }

    #[test]
    fn result_reply_flattens_result_object() {
        let reply = Reply::Result(JsonrpcResultResponse::new(
            RequestId::Integer(3),
            McpResult {
                meta: None,
                extra: json!({"tools": []}).as_object().cloned(),
            },
        ));

        assert!(reply.error().is_none());
        assert_eq!(Message::from(reply).kind(), "result");
    }
}
