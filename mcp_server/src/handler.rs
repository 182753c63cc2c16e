//! Dispatches JSON-RPC requests to the tools
use std::sync::Arc;

use discovery::ApplicationRuntime;
use log::{debug, warn};
use serde_json::{json, Value};

use crate::protocol::{
    CallToolParams, Content, JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse,
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::tools::PatentTools;

pub const SERVER_NAME: &str = "patent-discovery-mcp-server";

pub struct McpHandler {
    tools: PatentTools,
}

impl McpHandler {
    pub fn new(runtime: Arc<ApplicationRuntime>) -> Self {
        Self {
            tools: PatentTools::new(runtime),
        }
    }

    /// Answers one message. Notifications, i.e. `notifications/*` without an id, get no answer.
    pub async fn handle(&self, message: Value) -> Option<JsonRpcResponse> {
        let id = JsonRpcId::of(&message);
        let is_notification = message.get("id").is_none();

        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid request: {e}");
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {e}")),
                ));
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version '{}'",
                    request.jsonrpc
                )),
            ));
        }
        if is_notification && request.method.starts_with("notifications/") {
            debug!("Notification {}", request.method);
            return None;
        }

        debug!("Handling {} with id {:?}", request.method, request.id);
        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => {
                warn!("{} failed: {}", request.method, error.message);
                JsonRpcResponse::error(request.id, error)
            }
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")}
            })),
            "ping" => Ok(json!({})),
            "mcp.listTools" => Ok(json!(PatentTools::definitions())),
            "tools/list" => Ok(json!({ "tools": PatentTools::definitions() })),
            "mcp.callTool" => {
                let params = call_params(params)?;
                let arguments = params.arguments.unwrap_or(Value::Null);
                match self.tools.call(&params.name, &arguments).await {
                    Ok(text) => Ok(json!([Content::text(text)])),
                    Err(e) => Err(JsonRpcError::internal_error(e.to_string())),
                }
            }
            "tools/call" => {
                let params = call_params(params)?;
                let arguments = params.arguments.unwrap_or(Value::Null);
                let (text, is_error) = match self.tools.call(&params.name, &arguments).await {
                    Ok(text) => (text, false),
                    Err(e) => (
                        format!("Error executing tool '{}': {e}", params.name),
                        true,
                    ),
                };
                Ok(json!({ "content": [Content::text(text)], "isError": is_error }))
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }
}

fn call_params(params: Option<Value>) -> Result<CallToolParams, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool call: {e}")))
}
