//! Turn orchestration over streaming completions and dynamic tools.
//!
//! One turn flows through three pieces: the [`TurnOrchestrator`] consumes the
//! model's raw stream and emits normalized [`TurnEvent`]s, the
//! [`TurnProjection`] folds those events into the in-flight assistant
//! message, and the [`Transcript`] commits the finished turn and serializes
//! it back into wire form for the next request.

mod error;
mod hooks;
mod orchestrator;
mod projection;
mod service;
mod transcript;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatMessage, ChatRole, ChatService, ChatServiceBuilder,
        ChatSession, FAILURE_NOTICE, NoopTurnHooks, ToolCallOutcome, ToolCallRecord, Transcript,
        TurnEvent, TurnEventStream, TurnHooks, TurnOrchestrator, TurnProjection,
    };
    pub use wcommon::{MetadataMap, SessionId, TraceId};
    pub use wtooling::{
        DefaultToolRuntime, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolExecutionResult, ToolRegistry, ToolRuntime,
    };
}

pub use error::{ChatError, ChatErrorKind};
pub use hooks::{NoopTurnHooks, TurnHooks};
pub use orchestrator::{TurnEvent, TurnEventStream, TurnOrchestrator};
pub use projection::{FAILURE_NOTICE, TurnProjection};
pub use service::{ChatService, ChatServiceBuilder, ChatSession};
pub use transcript::{ChatMessage, ChatRole, ToolCallOutcome, ToolCallRecord, Transcript};
pub use wcommon::{MetadataMap, SessionId, TraceId};
pub use wtooling::{
    DefaultToolRuntime, Tool, ToolError, ToolErrorKind, ToolExecutionContext, ToolExecutionResult,
    ToolRegistry, ToolRuntime,
};
