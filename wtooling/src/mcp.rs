//! MCP tool discovery and execution over streamable HTTP.
//!
//! Speaks JSON-RPC 2.0 against a single POST endpoint (`{base_url}/mcp`).
//! Stateless servers answer with plain JSON; session-oriented ones frame the
//! response as a one-shot SSE stream, so both framings are accepted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use wmodel::ToolDefinition;

use crate::{ToolError, ToolFuture, ToolRegistry};

/// Transport seam for the JSON-RPC exchange. Posts one request envelope and
/// returns the raw response body, leaving framing and envelope decoding to
/// the client.
pub trait McpTransport: Send + Sync {
    fn post<'a>(&'a self, envelope: Value) -> ToolFuture<'a, Result<String, ToolError>>;
}

#[derive(Debug, Clone)]
pub struct McpHttpTransport {
    client: Client,
    endpoint: String,
}

impl McpHttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            endpoint: format!("{}/mcp", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl McpTransport for McpHttpTransport {
    fn post<'a>(&'a self, envelope: Value) -> ToolFuture<'a, Result<String, ToolError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.endpoint)
                .header("Accept", "application/json, text/event-stream")
                .json(&envelope)
                .send()
                .await
                .map_err(|err| ToolError::protocol(format!("MCP request failed: {err}")))?;

            if !response.status().is_success() {
                return Err(ToolError::protocol(format!(
                    "MCP endpoint returned status {}",
                    response.status()
                )));
            }

            response
                .text()
                .await
                .map_err(|err| ToolError::protocol(format!("MCP response unreadable: {err}")))
        })
    }
}

pub struct McpClient {
    transport: Arc<dyn McpTransport>,
    next_request_id: AtomicU64,
}

impl McpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(Arc::new(McpHttpTransport::new(base_url)))
    }

    pub fn with_transport(transport: Arc<dyn McpTransport>) -> Self {
        Self {
            transport,
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Discovers the server's tools as completion-ready definitions.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ToolError> {
        let result = self.rpc("tools/list", json!({})).await?;
        let listing: McpToolListing = serde_json::from_value(result)
            .map_err(|err| ToolError::protocol(format!("malformed tools/list result: {err}")))?;

        Ok(listing
            .tools
            .into_iter()
            .map(|tool| ToolDefinition {
                description: tool
                    .description
                    .unwrap_or_else(|| format!("Execute {}", tool.name)),
                input_schema: tool
                    .input_schema
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
                name: tool.name,
            })
            .collect())
    }

    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<Value, ToolError> {
        let result = self
            .rpc("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;

        decode_tool_result(result).map_err(|error| error.with_tool_name(name))
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let body = self.transport.post(envelope).await?;
        decode_rpc_body(&body)
    }
}

/// Registers every tool the MCP server advertises as a proxying entry in the
/// local registry. Returns how many tools were added.
pub async fn register_mcp_tools(
    registry: &mut ToolRegistry,
    client: Arc<McpClient>,
) -> Result<usize, ToolError> {
    let definitions = client.list_tools().await?;
    let count = definitions.len();

    for definition in definitions {
        let client = Arc::clone(&client);
        let name = definition.name.clone();
        registry.register_fn(definition, move |arguments, _context| {
            let client = Arc::clone(&client);
            let name = name.clone();
            async move { client.call_tool(&name, &arguments).await }
        });
    }

    Ok(count)
}

fn decode_rpc_body(body: &str) -> Result<Value, ToolError> {
    let trimmed = body.trim();
    let payload = if trimmed.starts_with('{') {
        trimmed
    } else {
        trimmed
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .ok_or_else(|| ToolError::protocol("MCP response carried no JSON payload"))?
    };

    let envelope: Value = serde_json::from_str(payload)
        .map_err(|err| ToolError::protocol(format!("malformed MCP response: {err}")))?;

    if let Some(error) = envelope.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified MCP error");
        return Err(ToolError::protocol(message));
    }

    envelope
        .get("result")
        .cloned()
        .ok_or_else(|| ToolError::protocol("MCP response missing result"))
}

/// Unwraps an MCP `tools/call` result. Text content is decoded as JSON when
/// it parses, kept as a plain string otherwise; non-text content falls back
/// to the raw result value.
fn decode_tool_result(result: Value) -> Result<Value, ToolError> {
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let text = result.get("content").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(|item| {
                if item.get("type").and_then(Value::as_str) == Some("text") {
                    item.get("text").and_then(Value::as_str)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    });

    match text {
        Some(text) if is_error => Err(ToolError::execution(text)),
        Some(text) => Ok(serde_json::from_str(&text).unwrap_or(Value::String(text))),
        None if is_error => Err(ToolError::execution("tool reported an error")),
        None => Ok(result),
    }
}

#[derive(Debug, Deserialize)]
struct McpToolListing {
    #[serde(default)]
    tools: Vec<McpToolEntry>,
}

#[derive(Debug, Deserialize)]
struct McpToolEntry {
    name: String,
    description: Option<String>,
    #[serde(rename = "inputSchema")]
    input_schema: Option<Value>,
}
