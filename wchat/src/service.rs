//! Chat service: session state plus the glue that runs one turn end to end.
//!
//! `run_turn` serializes the session history, drives the orchestrator, and
//! applies the projection to every event before yielding it, committing the
//! finished user and assistant messages only when the turn reaches its
//! terminal event. The `&mut ChatSession` borrow makes two concurrent turns
//! over one transcript unrepresentable; dropping the returned stream
//! abandons the turn without committing anything.

use std::sync::Arc;

use async_stream::stream;
use futures_util::StreamExt;
use wcommon::{GenerationOptions, SessionId};
use wmodel::{CompletionClient, CompletionRequest, WireMessage};
use wtooling::{DefaultToolRuntime, ToolExecutionContext, ToolRegistry, ToolRuntime};

use crate::{
    ChatError, ChatMessage, NoopTurnHooks, Transcript, TurnEvent, TurnEventStream,
    TurnHooks, TurnOrchestrator, TurnProjection,
};

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: SessionId,
    pub model: String,
    pub transcript: Transcript,
}

impl ChatSession {
    pub fn new(id: impl Into<SessionId>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            transcript: Transcript::new(),
        }
    }

    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }
}

pub struct ChatService {
    client: Arc<dyn CompletionClient>,
    runtime: Arc<dyn ToolRuntime>,
    hooks: Arc<dyn TurnHooks>,
    options: GenerationOptions,
}

impl ChatService {
    pub fn new(client: Arc<dyn CompletionClient>, runtime: Arc<dyn ToolRuntime>) -> Self {
        Self::builder(client).tool_runtime(runtime).build()
    }

    pub fn builder(client: Arc<dyn CompletionClient>) -> ChatServiceBuilder {
        ChatServiceBuilder {
            client,
            runtime: Arc::new(DefaultToolRuntime::new(Arc::new(ToolRegistry::new()))),
            hooks: Arc::new(NoopTurnHooks),
            options: GenerationOptions::default(),
        }
    }

    /// Runs one turn for `user_input` against the session's transcript.
    ///
    /// Returns the normalized event stream for the turn. The user and
    /// assistant messages are committed to the transcript when the stream
    /// yields its terminal event, never earlier.
    pub fn run_turn<'a>(
        &self,
        session: &'a mut ChatSession,
        user_input: impl Into<String>,
    ) -> Result<TurnEventStream<'a>, ChatError> {
        let user_input = user_input.into();
        if user_input.trim().is_empty() {
            return Err(ChatError::invalid_request("user input must not be empty"));
        }

        self.hooks.on_turn_start(&session.id, &user_input);

        let mut messages = session.transcript.serialize()?;
        messages.push(WireMessage::user(user_input.clone()));

        let request = CompletionRequest::new(session.model.clone(), messages)
            .with_tools(self.runtime.definitions())
            .with_options(self.options)
            .enable_streaming();
        request.validate()?;

        let user_id = session.transcript.next_message_id();
        let user_message = ChatMessage::user(user_id, user_input);
        let assistant_id = session.transcript.next_message_id();

        let orchestrator =
            TurnOrchestrator::new(Arc::clone(&self.client), Arc::clone(&self.runtime));
        let inner = orchestrator.run_turn(request, ToolExecutionContext::new(session.id.clone()));
        let hooks = Arc::clone(&self.hooks);

        Ok(Box::pin(stream! {
            let mut inner = inner;
            let mut projection = Some(TurnProjection::new(assistant_id));
            let mut user_message = Some(user_message);

            while let Some(event) = inner.next().await {
                if let Some(active) = projection.as_mut() {
                    active.apply(&event);
                }

                match &event {
                    TurnEvent::ToolCallRequested { call_id, name, .. } => {
                        hooks.on_tool_call(&session.id, call_id, name);
                    }
                    TurnEvent::TurnComplete | TurnEvent::TurnFailed(_) => {
                        if let (Some(finished), Some(user)) =
                            (projection.take(), user_message.take())
                        {
                            let message = finished.into_message();
                            match &event {
                                TurnEvent::TurnFailed(error) => {
                                    hooks.on_turn_failed(&session.id, error);
                                }
                                _ => hooks.on_turn_complete(&session.id, &message),
                            }

                            session.transcript.append(user);
                            session.transcript.append(message);
                        }

                        yield event;
                        return;
                    }
                    _ => {}
                }

                yield event;
            }
        }))
    }
}

pub struct ChatServiceBuilder {
    client: Arc<dyn CompletionClient>,
    runtime: Arc<dyn ToolRuntime>,
    hooks: Arc<dyn TurnHooks>,
    options: GenerationOptions,
}

impl ChatServiceBuilder {
    pub fn tool_runtime(mut self, runtime: Arc<dyn ToolRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn TurnHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn generation_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> ChatService {
        ChatService {
            client: self.client,
            runtime: self.runtime,
            hooks: self.hooks,
            options: self.options,
        }
    }
}
