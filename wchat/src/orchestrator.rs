//! Turn orchestration: one pass over the completion stream, tool execution
//! on the finish signal, and a normalized event sequence out.
//!
//! The orchestrator consumes the model's raw stream exactly once. Text deltas
//! are forwarded immediately; tool-call fragments accumulate in
//! [`PendingTurnState`] until the model signals it is done producing calls,
//! at which point every pending call is finalized and executed strictly in
//! creation order. The output sequence always ends with exactly one terminal
//! event, `TurnComplete` or `TurnFailed`.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value;
use wmodel::{CompletionClient, CompletionRequest, FinishReason, StreamEvent, ToolCallFragment};
use wtooling::{ToolExecutionContext, ToolInvocation, ToolRuntime};

use crate::{ChatError, ToolCallOutcome};

/// Normalized turn progress. `ToolCallRequested` only appears once a call's
/// arguments are fully accumulated and decoded; a call whose raw buffer never
/// parses yields only a `ToolCallResolved` with a failure outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    TextDelta(String),
    ToolCallRequested {
        call_id: String,
        name: String,
        arguments: Value,
    },
    ToolCallResolved {
        call_id: String,
        outcome: ToolCallOutcome,
    },
    TurnComplete,
    TurnFailed(ChatError),
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::TurnComplete | TurnEvent::TurnFailed(_))
    }
}

pub type TurnEventStream<'a> = Pin<Box<dyn Stream<Item = TurnEvent> + Send + 'a>>;

/// One in-progress tool call, keyed by the stream position the model
/// assigned it. Buffers grow by concatenation only.
#[derive(Debug, Default)]
struct PendingCall {
    index: u32,
    id: String,
    name: String,
    arguments: String,
}

impl PendingCall {
    fn open(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// The model occasionally omits the call id; fall back to a stable
    /// index-derived one so the transcript pairing still holds.
    fn call_id(&self) -> String {
        if self.id.is_empty() {
            format!("tool_call_{}", self.index)
        } else {
            self.id.clone()
        }
    }
}

/// Ephemeral accumulation state for one orchestration cycle. A fragment whose
/// index differs from the cursor opens a new record (closing none); a
/// fragment matching the cursor concatenates onto the current record's
/// buffers. Dropped with the stream when the turn ends.
#[derive(Debug, Default)]
struct PendingTurnState {
    calls: Vec<PendingCall>,
    cursor: Option<u32>,
}

impl PendingTurnState {
    fn absorb(&mut self, fragment: ToolCallFragment) {
        if self.cursor != Some(fragment.index) {
            self.calls.push(PendingCall::open(fragment.index));
            self.cursor = Some(fragment.index);
        }

        if let Some(call) = self.calls.last_mut() {
            if let Some(id) = fragment.id {
                call.id.push_str(&id);
            }

            if let Some(name) = fragment.name {
                call.name.push_str(&name);
            }

            if let Some(arguments) = fragment.arguments {
                call.arguments.push_str(&arguments);
            }
        }
    }

    fn take_calls(&mut self) -> Vec<PendingCall> {
        self.cursor = None;
        std::mem::take(&mut self.calls)
    }
}

pub struct TurnOrchestrator {
    client: Arc<dyn CompletionClient>,
    runtime: Arc<dyn ToolRuntime>,
}

impl TurnOrchestrator {
    pub fn new(client: Arc<dyn CompletionClient>, runtime: Arc<dyn ToolRuntime>) -> Self {
        Self { client, runtime }
    }

    /// Drives one turn against the already-serialized history in `request`.
    ///
    /// The returned stream is lazy: nothing is submitted to the model until
    /// it is polled, and dropping it abandons the turn.
    pub fn run_turn(
        &self,
        request: CompletionRequest,
        context: ToolExecutionContext,
    ) -> TurnEventStream<'static> {
        let client = Arc::clone(&self.client);
        let runtime = Arc::clone(&self.runtime);

        Box::pin(stream! {
            let mut source = match client.stream(request).await {
                Ok(source) => source,
                Err(error) => {
                    yield TurnEvent::TurnFailed(ChatError::from(error));
                    return;
                }
            };

            let mut pending = PendingTurnState::default();

            loop {
                let Some(event) = source.next().await else {
                    // Stream ended without a finish signal; pending calls
                    // were never authorized for execution and are discarded.
                    yield TurnEvent::TurnComplete;
                    return;
                };

                match event {
                    Ok(StreamEvent::TextDelta(delta)) => yield TurnEvent::TextDelta(delta),
                    Ok(StreamEvent::ToolCall(fragment)) => pending.absorb(fragment),
                    Ok(StreamEvent::Finished(FinishReason::ToolCalls)) => {
                        for call in pending.take_calls() {
                            let call_id = call.call_id();

                            let arguments: Value = match serde_json::from_str(&call.arguments) {
                                Ok(arguments) => arguments,
                                Err(err) => {
                                    yield TurnEvent::ToolCallResolved {
                                        call_id,
                                        outcome: ToolCallOutcome::Failure(format!(
                                            "arguments for '{}' did not parse: {err}",
                                            call.name
                                        )),
                                    };
                                    continue;
                                }
                            };

                            yield TurnEvent::ToolCallRequested {
                                call_id: call_id.clone(),
                                name: call.name.clone(),
                                arguments: arguments.clone(),
                            };

                            let invocation =
                                ToolInvocation::new(call_id.clone(), call.name, arguments);
                            let outcome =
                                match runtime.execute(invocation, context.clone()).await {
                                    Ok(result) => ToolCallOutcome::Success(result.output),
                                    Err(error) => ToolCallOutcome::Failure(error.to_string()),
                                };

                            yield TurnEvent::ToolCallResolved { call_id, outcome };
                        }

                        yield TurnEvent::TurnComplete;
                        return;
                    }
                    Ok(StreamEvent::Finished(_)) => {
                        yield TurnEvent::TurnComplete;
                        return;
                    }
                    Err(error) => {
                        // Transport failure mid-stream: nothing pending is
                        // executed, the turn surfaces the failure and ends.
                        yield TurnEvent::TurnFailed(ChatError::from(error));
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use wmodel::{
        BoxedEventStream, ClientFuture, CompletionError, ToolDefinition, VecEventStream,
    };
    use wtooling::{DefaultToolRuntime, ToolError, ToolRegistry};

    use super::*;
    use crate::ChatErrorKind;

    struct ScriptedClient {
        events: Mutex<Option<Vec<Result<StreamEvent, CompletionError>>>>,
    }

    impl ScriptedClient {
        fn new(events: Vec<Result<StreamEvent, CompletionError>>) -> Self {
            Self {
                events: Mutex::new(Some(events)),
            }
        }
    }

    impl CompletionClient for ScriptedClient {
        fn stream<'a>(
            &'a self,
            _request: CompletionRequest,
        ) -> ClientFuture<'a, Result<BoxedEventStream<'a>, CompletionError>> {
            Box::pin(async move {
                let events = self
                    .events
                    .lock()
                    .expect("events lock")
                    .take()
                    .expect("script consumed once");

                Ok(Box::pin(VecEventStream::new(events)) as BoxedEventStream<'a>)
            })
        }
    }

    fn offers_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(
            ToolDefinition {
                name: "get_commerce_offers".to_string(),
                description: "Search for commerce product offers".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"]
                }),
            },
            |arguments, _ctx| {
                Ok(json!({
                    "offers": ["trail runner", "road racer"],
                    "total": 2,
                    "query": arguments["query"],
                }))
            },
        );
        registry
    }

    fn orchestrator(
        events: Vec<Result<StreamEvent, CompletionError>>,
        registry: ToolRegistry,
    ) -> TurnOrchestrator {
        TurnOrchestrator::new(
            Arc::new(ScriptedClient::new(events)),
            Arc::new(DefaultToolRuntime::new(Arc::new(registry))),
        )
    }

    async fn collect(orchestrator: &TurnOrchestrator) -> Vec<TurnEvent> {
        let request = CompletionRequest::new(
            "gpt-4o-mini",
            vec![wmodel::WireMessage::user("find running shoes")],
        );

        orchestrator
            .run_turn(request, ToolExecutionContext::new("session-1"))
            .collect()
            .await
    }

    #[tokio::test]
    async fn text_deltas_are_forwarded_in_order() {
        let orchestrator = orchestrator(
            vec![
                Ok(StreamEvent::TextDelta("hel".to_string())),
                Ok(StreamEvent::TextDelta("lo".to_string())),
                Ok(StreamEvent::Finished(FinishReason::Stop)),
            ],
            ToolRegistry::new(),
        );

        let events = collect(&orchestrator).await;
        assert_eq!(
            events,
            vec![
                TurnEvent::TextDelta("hel".to_string()),
                TurnEvent::TextDelta("lo".to_string()),
                TurnEvent::TurnComplete,
            ]
        );
    }

    #[tokio::test]
    async fn running_shoes_turn_requests_and_resolves_one_call() {
        let orchestrator = orchestrator(
            vec![
                Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
                    0,
                    "call_1",
                    "get_commerce_offers",
                ))),
                Ok(StreamEvent::ToolCall(ToolCallFragment::arguments(
                    0,
                    "{\"query\":\"run",
                ))),
                Ok(StreamEvent::ToolCall(ToolCallFragment::arguments(
                    0,
                    "ning shoes\"}",
                ))),
                Ok(StreamEvent::Finished(FinishReason::ToolCalls)),
            ],
            offers_registry(),
        );

        let events = collect(&orchestrator).await;
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            TurnEvent::ToolCallRequested {
                call_id: "call_1".to_string(),
                name: "get_commerce_offers".to_string(),
                arguments: json!({"query": "running shoes"}),
            }
        );
        assert_eq!(
            events[1],
            TurnEvent::ToolCallResolved {
                call_id: "call_1".to_string(),
                outcome: ToolCallOutcome::Success(json!({
                    "offers": ["trail runner", "road racer"],
                    "total": 2,
                    "query": "running shoes",
                })),
            }
        );
        assert_eq!(events[2], TurnEvent::TurnComplete);
    }

    #[tokio::test]
    async fn argument_accumulation_is_independent_of_fragment_granularity() {
        let whole = orchestrator(
            vec![
                Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
                    0,
                    "call_1",
                    "get_commerce_offers",
                ))),
                Ok(StreamEvent::ToolCall(ToolCallFragment::arguments(
                    0,
                    "{\"query\":\"running shoes\"}",
                ))),
                Ok(StreamEvent::Finished(FinishReason::ToolCalls)),
            ],
            offers_registry(),
        );

        let mut char_events = vec![Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
            0,
            "call_1",
            "get_commerce_offers",
        )))];
        for ch in "{\"query\":\"running shoes\"}".chars() {
            char_events.push(Ok(StreamEvent::ToolCall(ToolCallFragment::arguments(
                0,
                ch.to_string(),
            ))));
        }
        char_events.push(Ok(StreamEvent::Finished(FinishReason::ToolCalls)));
        let char_by_char = orchestrator(char_events, offers_registry());

        assert_eq!(collect(&whole).await, collect(&char_by_char).await);
    }

    #[tokio::test]
    async fn failing_call_does_not_abort_sibling_calls() {
        let mut registry = offers_registry();
        registry.register_sync_fn(
            ToolDefinition {
                name: "broken".to_string(),
                description: "Always fails".to_string(),
                input_schema: json!({"type": "object"}),
            },
            |_arguments, _ctx| Err(ToolError::execution("backend unavailable")),
        );

        let orchestrator = orchestrator(
            vec![
                Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
                    0, "call_a", "broken",
                ))),
                Ok(StreamEvent::ToolCall(ToolCallFragment::arguments(0, "{}"))),
                Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
                    1,
                    "call_b",
                    "get_commerce_offers",
                ))),
                Ok(StreamEvent::ToolCall(ToolCallFragment::arguments(
                    1,
                    "{\"query\":\"socks\"}",
                ))),
                Ok(StreamEvent::Finished(FinishReason::ToolCalls)),
            ],
            registry,
        );

        let events = collect(&orchestrator).await;
        assert_eq!(events.len(), 5);

        match &events[1] {
            TurnEvent::ToolCallResolved { call_id, outcome } => {
                assert_eq!(call_id, "call_a");
                assert!(outcome.is_failure());
            }
            other => panic!("expected resolution for call_a, got {other:?}"),
        }

        match &events[3] {
            TurnEvent::ToolCallResolved { call_id, outcome } => {
                assert_eq!(call_id, "call_b");
                assert!(!outcome.is_failure());
            }
            other => panic!("expected resolution for call_b, got {other:?}"),
        }

        assert_eq!(events[4], TurnEvent::TurnComplete);
    }

    #[tokio::test]
    async fn unparsable_arguments_resolve_as_failure_without_a_request_event() {
        let orchestrator = orchestrator(
            vec![
                Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
                    0,
                    "call_1",
                    "get_commerce_offers",
                ))),
                Ok(StreamEvent::ToolCall(ToolCallFragment::arguments(
                    0,
                    "{\"query\": unterminated",
                ))),
                Ok(StreamEvent::Finished(FinishReason::ToolCalls)),
            ],
            offers_registry(),
        );

        let events = collect(&orchestrator).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            TurnEvent::ToolCallResolved { call_id, outcome }
                if call_id == "call_1" && outcome.is_failure()
        ));
        assert_eq!(events[1], TurnEvent::TurnComplete);
    }

    #[tokio::test]
    async fn mid_stream_error_fails_turn_without_executing_pending_calls() {
        let orchestrator = orchestrator(
            vec![
                Ok(StreamEvent::TextDelta("let me check".to_string())),
                Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
                    0,
                    "call_1",
                    "get_commerce_offers",
                ))),
                Err(CompletionError::transport("connection reset")),
            ],
            offers_registry(),
        );

        let events = collect(&orchestrator).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TurnEvent::TextDelta("let me check".to_string()));
        match &events[1] {
            TurnEvent::TurnFailed(error) => assert_eq!(error.kind, ChatErrorKind::Completion),
            other => panic!("expected TurnFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_stop_discards_pending_calls() {
        let orchestrator = orchestrator(
            vec![
                Ok(StreamEvent::ToolCall(ToolCallFragment::opening(
                    0,
                    "call_1",
                    "get_commerce_offers",
                ))),
                Ok(StreamEvent::Finished(FinishReason::Stop)),
            ],
            offers_registry(),
        );

        let events = collect(&orchestrator).await;
        assert_eq!(events, vec![TurnEvent::TurnComplete]);
    }

    #[tokio::test]
    async fn missing_call_id_falls_back_to_index_derived_id() {
        let orchestrator = orchestrator(
            vec![
                Ok(StreamEvent::ToolCall(ToolCallFragment {
                    index: 3,
                    id: None,
                    name: Some("get_commerce_offers".to_string()),
                    arguments: Some("{\"query\":\"boots\"}".to_string()),
                })),
                Ok(StreamEvent::Finished(FinishReason::ToolCalls)),
            ],
            offers_registry(),
        );

        let events = collect(&orchestrator).await;
        assert!(matches!(
            &events[0],
            TurnEvent::ToolCallRequested { call_id, .. } if call_id == "tool_call_3"
        ));
    }
}
