//! OpenAI chat-completions client behind the `CompletionClient` boundary.
//!
//! Tool-call deltas are forwarded fragment-by-fragment with their stream
//! index; accumulation is the orchestrator's job, not the transport's.

use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    BoxedEventStream, ClientFuture, CompletionClient, CompletionError, CompletionRequest,
    FinishReason, StreamEvent, ToolCallFragment, ToolDefinition, WireMessage, WireRole,
};

#[derive(Clone)]
pub struct OpenAiClient {
    transport: Arc<dyn OpenAiTransport>,
    api_key: String,
    fallback_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, transport: Arc<dyn OpenAiTransport>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            fallback_model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    fn build_api_request(&self, request: CompletionRequest) -> OpenAiApiRequest {
        let model = if request.model.trim().is_empty() {
            self.fallback_model.clone()
        } else {
            request.model
        };

        let messages = request
            .messages
            .into_iter()
            .map(OpenAiApiMessage::from)
            .collect::<Vec<_>>();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .into_iter()
                    .map(OpenAiApiTool::from)
                    .collect::<Vec<_>>(),
            )
        };

        OpenAiApiRequest {
            model,
            messages,
            tools,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream: true,
        }
    }
}

impl CompletionClient for OpenAiClient {
    fn stream<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ClientFuture<'a, Result<BoxedEventStream<'a>, CompletionError>> {
        Box::pin(async move {
            request.validate()?;

            if self.api_key.trim().is_empty() {
                return Err(CompletionError::authentication(
                    "no OpenAI API key configured",
                ));
            }

            let api_request = self.build_api_request(request);
            self.transport.stream(api_request, self.api_key.clone()).await
        })
    }
}

pub trait OpenAiTransport: Send + Sync {
    fn stream<'a>(
        &'a self,
        request: OpenAiApiRequest,
        api_key: String,
    ) -> ClientFuture<'a, Result<BoxedEventStream<'a>, CompletionError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl Default for OpenAiHttpTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl OpenAiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn parse_error(response: Response) -> CompletionError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("OpenAI request failed with status {status}"));

        classify_status(status, message)
    }
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn stream<'a>(
        &'a self,
        request: OpenAiApiRequest,
        api_key: String,
    ) -> ClientFuture<'a, Result<BoxedEventStream<'a>, CompletionError>> {
        Box::pin(async move {
            let url = self.endpoint("chat/completions");
            let response = self
                .client
                .post(url)
                .bearer_auth(&api_key)
                .json(&request)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        CompletionError::timeout(err.to_string())
                    } else {
                        CompletionError::transport(err.to_string())
                    }
                })?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let stream = async_stream::stream! {
                let mut chunks = response.bytes_stream();
                let mut sse_buffer = String::new();

                'receive: while let Some(item) = chunks.next().await {
                    let bytes = match item {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            yield Err(CompletionError::transport(err.to_string()));
                            break;
                        }
                    };

                    match std::str::from_utf8(&bytes) {
                        Ok(text) => sse_buffer.push_str(text),
                        Err(err) => {
                            yield Err(CompletionError::protocol(err.to_string()));
                            break;
                        }
                    }

                    while let Some(newline_index) = sse_buffer.find('\n') {
                        let line = sse_buffer.drain(..=newline_index).collect::<String>();
                        let line = line.trim();

                        if !line.starts_with("data:") {
                            continue;
                        }

                        let payload = line.trim_start_matches("data:").trim();
                        if payload == "[DONE]" {
                            break 'receive;
                        }

                        match chunk_events(payload) {
                            Ok(events) => {
                                for event in events {
                                    yield Ok(event);
                                }
                            }
                            Err(err) => {
                                yield Err(err);
                                break 'receive;
                            }
                        }
                    }
                }
            };

            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }
}

fn classify_status(status: StatusCode, message: String) -> CompletionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CompletionError::authentication(message)
        }
        StatusCode::TOO_MANY_REQUESTS => CompletionError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CompletionError::timeout(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            CompletionError::invalid_request(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            CompletionError::unavailable(message)
        }
        _ => CompletionError::transport(message),
    }
}

fn parse_finish_reason(value: &str) -> FinishReason {
    match value {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" => FinishReason::ToolCalls,
        _ => FinishReason::Other,
    }
}

/// Maps one SSE `data:` payload to zero or more stream events, preserving
/// fragment granularity for tool-call deltas.
fn chunk_events(payload: &str) -> Result<Vec<StreamEvent>, CompletionError> {
    let parsed: OpenAiApiStreamResponse = serde_json::from_str(payload)
        .map_err(|err| CompletionError::protocol(format!("malformed stream chunk: {err}")))?;

    let mut events = Vec::new();
    let Some(choice) = parsed.choices.first() else {
        return Ok(events);
    };

    if let Some(content) = &choice.delta.content
        && !content.is_empty()
    {
        events.push(StreamEvent::TextDelta(content.clone()));
    }

    if let Some(delta_calls) = &choice.delta.tool_calls {
        for delta_call in delta_calls {
            events.push(StreamEvent::ToolCall(ToolCallFragment {
                index: delta_call.index.unwrap_or(0),
                id: delta_call.id.clone(),
                name: delta_call
                    .function
                    .as_ref()
                    .and_then(|function| function.name.clone()),
                arguments: delta_call
                    .function
                    .as_ref()
                    .and_then(|function| function.arguments.clone()),
            }));
        }
    }

    if let Some(reason) = choice.finish_reason.as_deref() {
        events.push(StreamEvent::Finished(parse_finish_reason(reason)));
    }

    Ok(events)
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<OpenAiApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Deserialize)]
struct OpenAiApiErrorEnvelope {
    error: OpenAiApiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiError {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiApiRequest {
    pub model: String,
    pub messages: Vec<OpenAiApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiApiMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl From<WireMessage> for OpenAiApiMessage {
    fn from(value: WireMessage) -> Self {
        let role = match value.role {
            WireRole::User => "user",
            WireRole::Assistant => "assistant",
            WireRole::ToolResult => "tool",
        };

        let tool_calls = if value.tool_calls.is_empty() {
            None
        } else {
            Some(
                value
                    .tool_calls
                    .into_iter()
                    .map(|descriptor| OpenAiApiToolCall {
                        id: descriptor.id,
                        r#type: "function".to_string(),
                        function: OpenAiApiCallFunction {
                            name: descriptor.name,
                            arguments: descriptor.arguments,
                        },
                    })
                    .collect(),
            )
        };

        Self {
            role: role.to_string(),
            content: value.content,
            tool_calls,
            tool_call_id: value.tool_call_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiApiToolCall {
    pub id: String,
    pub r#type: String,
    pub function: OpenAiApiCallFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiApiCallFunction {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiApiTool {
    pub r#type: String,
    pub function: OpenAiApiFunction,
}

impl From<ToolDefinition> for OpenAiApiTool {
    fn from(value: ToolDefinition) -> Self {
        Self {
            r#type: "function".to_string(),
            function: OpenAiApiFunction {
                name: value.name,
                description: value.description,
                parameters: value.input_schema,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiStreamResponse {
    choices: Vec<OpenAiApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiStreamChoice {
    delta: OpenAiApiStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAiApiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiApiDeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiDeltaToolCall {
    index: Option<u32>,
    id: Option<String>,
    function: Option<OpenAiApiDeltaToolFunction>,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiDeltaToolFunction {
    name: Option<String>,
    arguments: Option<String>,
}
