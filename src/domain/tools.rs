//! Interactive tools exposed via Model Context Protocol
//!
//! Provides the `echo` tool, which replies with the message it was given.

use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mcp::rpc::{
    json_rpc_error, json_rpc_error_with_data, schema_result, ParamsError, INVALID_PARAMS,
    METHOD_NOT_FOUND,
};
use crate::protocol::{Reply, RequestId};

pub const NO_MESSAGE_PROVIDED: &str = "No message provided";

#[macros::mcp_tool(name = "echo", description = "Echoes the input message")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EchoTool {
    /// The message to echo
    pub message: Option<String>,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![EchoTool::tool()]
}

pub fn echo(arguments: EchoTool) -> CallToolResult {
    let message = arguments.message.as_deref().unwrap_or(NO_MESSAGE_PROVIDED);

    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(
            format!("Echo: {message}"),
            None,
            None,
        ))],
        is_error: None,
        meta: None,
        structured_content: None,
    }
}

pub async fn handle_tools_call(id: RequestId, params: Option<Value>) -> Reply {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    match tool_call.name.as_str() {
        "echo" => {
            let arguments: EchoTool =
                match serde_json::from_value(json!(tool_call.arguments.unwrap_or_default())) {
                    Ok(value) => value,
                    Err(_) => {
                        return ParamsError::new(
                            "invalid_arguments",
                            "echo arguments must match the tool input schema",
                        )
                        .into_json_rpc(id)
                    }
                };

            schema_result(id, &echo(arguments))
        }
        _ => json_rpc_error_with_data(
            id,
            METHOD_NOT_FOUND,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": tool_call.name,
                },
            })),
        ),
    }
}
