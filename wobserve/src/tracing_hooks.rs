//! Tracing-based observability hooks for turn and tool lifecycle phases.
//!
//! ```rust
//! use wchat::TurnHooks;
//! use wobserve::TracingObservabilityHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn TurnHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use wchat::{ChatError, ChatMessage, TurnHooks};
use wcommon::SessionId;
use wtooling::{
    ToolError, ToolExecutionContext, ToolExecutionResult, ToolInvocation, ToolRuntimeHooks,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl TurnHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId, user_input: &str) {
        tracing::info!(
            phase = "turn",
            event = "start",
            session_id = %session_id,
            input_chars = user_input.len()
        );
    }

    fn on_tool_call(&self, session_id: &SessionId, call_id: &str, tool_name: &str) {
        tracing::info!(
            phase = "turn",
            event = "tool_call",
            session_id = %session_id,
            call_id,
            tool_name
        );
    }

    fn on_turn_complete(&self, session_id: &SessionId, message: &ChatMessage) {
        tracing::info!(
            phase = "turn",
            event = "complete",
            session_id = %session_id,
            message_id = message.id,
            text_chars = message.text.len(),
            tool_calls = message.tool_calls.len()
        );
    }

    fn on_turn_failed(&self, session_id: &SessionId, error: &ChatError) {
        tracing::error!(
            phase = "turn",
            event = "failed",
            session_id = %session_id,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, invocation: &ToolInvocation, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = invocation.name,
            tool_call_id = invocation.call_id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_execution_success(
        &self,
        invocation: &ToolInvocation,
        context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = invocation.name,
            tool_call_id = invocation.call_id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        invocation: &ToolInvocation,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = invocation.name,
            tool_call_id = invocation.call_id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}
