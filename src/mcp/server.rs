//! The central Model Context Protocol engine
//!
//! Drives a connection until end of stream, handles `initialize`, `ping`, `tools/list`
//! and `tools/call`, and logs every dispatched method with its duration.

use std::time::Instant;

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ListToolsResult, ServerCapabilities,
    ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::tools::{build_tools_list, handle_tools_call};
use crate::mcp::rpc::{
    json_rpc_error, json_rpc_result, schema_result, ParamsError, INVALID_REQUEST,
    METHOD_NOT_FOUND,
};
use crate::protocol::{Message, Notification, Reply, Request, RequestId, JSONRPC_VERSION};
use crate::transport::{Connection, Transport, TransportError};

/// Newest first; the first entry is offered when the client asks for something else.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

#[derive(Debug, Clone)]
pub struct McpServer {
    name: String,
    version: String,
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

impl McpServer {
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serves one connection from `transport` until the peer signals end of stream.
    pub async fn run<T: Transport>(&self, transport: T) -> Result<(), ServerError> {
        let mut connection = transport.connect().await?;
        let outcome = self.serve(&mut connection).await;

        if let Err(err) = connection.close().await {
            warn!(error = %err, "failed to close connection");
        }

        outcome
    }

    async fn serve<C: Connection>(&self, connection: &mut C) -> Result<(), ServerError> {
        let session_id = connection.session_id().map(str::to_owned);

        while let Some(message) = connection.read().await? {
            match message {
                Message::Request(request) => {
                    let reply = self.handle_request(request, session_id.as_deref()).await;
                    connection.write(&Message::Reply(reply)).await?;
                }
                Message::Notification(notification) => {
                    self.handle_notification(notification, session_id.as_deref());
                }
                Message::Response(response) => {
                    if !response.is_well_formed() {
                        return Err(ServerError::InvalidMessage(
                            "response must carry exactly one of result or error".to_string(),
                        ));
                    }

                    debug!(id = ?response.id, "ignoring unsolicited response");
                }
                Message::Reply(reply) => {
                    debug!(id = ?reply.id(), "ignoring reply sent by the peer");
                }
            }
        }

        Ok(())
    }

    pub async fn handle_request(&self, request: Request, session_id: Option<&str>) -> Reply {
        let Request {
            jsonrpc,
            id,
            method,
            params,
        } = request;

        if jsonrpc != JSONRPC_VERSION || method.trim().is_empty() {
            return json_rpc_error(id, INVALID_REQUEST, "Invalid Request");
        }

        info!(
            method = %method,
            session_id = session_id.unwrap_or_default(),
            has_params = params.is_some(),
            params = %redact_audit_params(params.as_ref()),
            "mcp method started"
        );

        let started_at = Instant::now();
        let reply = self.dispatch(id, &method, params).await;
        let duration_ms = started_at.elapsed().as_millis();

        match reply.error() {
            Some(error) => warn!(
                method = %method,
                session_id = session_id.unwrap_or_default(),
                duration_ms,
                code = error.code,
                error = %error.message,
                "mcp method failed"
            ),
            None => info!(
                method = %method,
                session_id = session_id.unwrap_or_default(),
                duration_ms,
                "mcp method completed"
            ),
        }

        reply
    }

    pub fn handle_notification(&self, notification: Notification, session_id: Option<&str>) {
        info!(
            method = %notification.method,
            session_id = session_id.unwrap_or_default(),
            params = %redact_audit_params(notification.params.as_ref()),
            "mcp notification received"
        );
    }

    async fn dispatch(&self, id: RequestId, method: &str, params: Option<Value>) -> Reply {
        match method {
            "initialize" => self.initialize(id, params.as_ref()),
            "ping" => json_rpc_result(id, json!({})),
            "tools/list" => schema_result(
                id,
                &ListToolsResult {
                    meta: None,
                    next_cursor: None,
                    tools: build_tools_list(),
                },
            ),
            "tools/call" => handle_tools_call(id, params).await,
            _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
        }
    }

    fn initialize(&self, id: RequestId, params: Option<&Value>) -> Reply {
        let protocol_version = match negotiate_protocol_version(params) {
            Ok(version) => version,
            Err(err) => return err.into_json_rpc(id),
        };

        let initialize_result = InitializeResult {
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                title: None,
                description: None,
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            protocol_version: protocol_version.to_string(),
            instructions: None,
            meta: None,
        };

        schema_result(id, &initialize_result)
    }
}

pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<&'static str, ParamsError> {
    let offered = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            ParamsError::new(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|supported| *supported == offered)
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]))
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    let redacted = if is_sensitive_key(key) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        redact_audit_value(item)
                    };
                    (key.clone(), redacted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    const MARKERS: [&str; 8] = [
        "token",
        "secret",
        "password",
        "credential",
        "authorization",
        "bearer",
        "api_key",
        "apikey",
    ];

    let normalized = key.trim().to_ascii_lowercase();
    MARKERS.iter().any(|marker| normalized.contains(marker))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::protocol::{Response, RpcError};

    /// Multi-message connection, the shape the runtime sees from long-lived transports.
    #[derive(Default)]
    struct ScriptedConnection {
        inbound: VecDeque<Message>,
        outbound: Vec<Message>,
        closed: bool,
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn read(&mut self) -> Result<Option<Message>, TransportError> {
            Ok(self.inbound.pop_front())
        }

        async fn write(&mut self, message: &Message) -> Result<(), TransportError> {
            self.outbound.push(message.clone());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.closed = true;
            Ok(())
        }

        fn session_id(&self) -> Option<&str> {
            Some("scripted")
        }
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> Message {
        Message::Request(Request {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Integer(id),
            method: method.to_string(),
            params,
        })
    }

    async fn exchange(message: Message) -> Result<Vec<Message>, ServerError> {
        let mut connection = ScriptedConnection {
            inbound: VecDeque::from([message]),
            ..Default::default()
        };
        McpServer::new().serve(&mut connection).await?;
        Ok(connection.outbound)
    }

    async fn single_reply(message: Message) -> Value {
        let outbound = exchange(message).await.expect("exchange succeeds");
        assert_eq!(outbound.len(), 1);
        serde_json::to_value(&outbound[0]).expect("serialize reply")
    }

    #[tokio::test]
    async fn answers_every_request_on_a_long_lived_connection() {
        let mut connection = ScriptedConnection {
            inbound: VecDeque::from([
                request(1, "ping", None),
                Message::Notification(Notification {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    method: "notifications/initialized".to_string(),
                    params: None,
                }),
                request(2, "tools/list", Some(json!({}))),
            ]),
            ..Default::default()
        };

        McpServer::new()
            .serve(&mut connection)
            .await
            .expect("serve succeeds");

        let ids = connection
            .outbound
            .iter()
            .map(|message| {
                serde_json::to_value(message).expect("serialize reply")["id"].clone()
            })
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![json!(1), json!(2)]);
        assert!(connection
            .outbound
            .iter()
            .all(|message| matches!(message, Message::Reply(Reply::Result(_)))));
    }

    #[tokio::test]
    async fn ping_returns_empty_result() {
        let reply = single_reply(request(9, "ping", None)).await;
        assert_eq!(reply, json!({"jsonrpc": "2.0", "id": 9, "result": {}}));
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let reply = single_reply(request(1, "resources/list", None)).await;
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(reply["error"]["message"], "Method not found");
    }

    #[tokio::test]
    async fn wrong_jsonrpc_version_is_invalid_request() {
        let reply = single_reply(Message::Request(Request {
            jsonrpc: "1.0".to_string(),
            id: RequestId::Integer(4),
            method: "ping".to_string(),
            params: None,
        }))
        .await;

        assert_eq!(reply["id"], 4);
        assert_eq!(reply["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn initialize_reports_server_info_and_tools_capability() {
        let reply = single_reply(request(
            1,
            "initialize",
            Some(json!({
                "protocolVersion": "2025-03-26",
                "clientInfo": {"name": "test-client", "version": "1.0.0"},
                "capabilities": {}
            })),
        ))
        .await;

        assert_eq!(reply["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(reply["result"]["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(
            reply["result"]["serverInfo"]["version"],
            env!("CARGO_PKG_VERSION")
        );
        assert!(reply["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn initialize_without_protocol_version_is_invalid_params() {
        let reply = single_reply(request(1, "initialize", Some(json!({})))).await;
        assert_eq!(reply["error"]["code"], -32602);
        assert_eq!(reply["error"]["data"]["code"], "invalid_protocol_version");
    }

    #[tokio::test]
    async fn notifications_produce_no_reply() {
        let outbound = exchange(Message::Notification(Notification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "notifications/initialized".to_string(),
            params: None,
        }))
        .await
        .expect("exchange succeeds");

        assert!(outbound.is_empty());
    }

    #[tokio::test]
    async fn well_formed_response_is_ignored() {
        let outbound = exchange(Message::Response(Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(RequestId::Integer(1)),
            result: None,
            error: Some(RpcError {
                code: -1,
                message: "client side".to_string(),
                data: None,
            }),
        }))
        .await
        .expect("exchange succeeds");

        assert!(outbound.is_empty());
    }

    #[tokio::test]
    async fn bare_response_is_rejected() {
        let err = exchange(Message::Response(Response::default()))
            .await
            .expect_err("bare response must fail");
        assert!(matches!(err, ServerError::InvalidMessage(_)));
    }

    #[test]
    fn negotiate_protocol_version_echoes_supported_version() {
        let params = json!({"protocolVersion": "2024-11-05"});
        assert_eq!(
            negotiate_protocol_version(Some(&params)).expect("supported"),
            "2024-11-05"
        );
    }

    #[test]
    fn negotiate_protocol_version_offers_latest_for_unknown_version() {
        let params = json!({"protocolVersion": "2026-01-01"});
        assert_eq!(
            negotiate_protocol_version(Some(&params)).expect("fallback"),
            SUPPORTED_PROTOCOL_VERSIONS[0]
        );
    }

    #[test]
    fn redacts_sensitive_fields_in_audit_params() {
        let params = json!({
            "name": "echo",
            "arguments": {
                "message": "hi",
                "accessToken": "should-not-appear",
                "nested": [{"client_secret": "should-not-appear"}]
            }
        });

        let redacted = redact_audit_params(Some(&params));

        assert_eq!(redacted["name"], json!("echo"));
        assert_eq!(redacted["arguments"]["message"], json!("hi"));
        assert_eq!(redacted["arguments"]["accessToken"], json!("[REDACTED]"));
        assert_eq!(
            redacted["arguments"]["nested"][0]["client_secret"],
            json!("[REDACTED]")
        );
    }
}
