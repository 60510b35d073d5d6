//! Metrics-based observability hooks for turn and tool lifecycle phases.
//!
//! ```rust
//! use wobserve::MetricsObservabilityHooks;
//! use wtooling::ToolRuntimeHooks;
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_tool_hooks(&hooks);
//! ```

use std::time::Duration;

use wchat::{ChatError, ChatMessage, TurnHooks};
use wcommon::SessionId;
use wtooling::{
    ToolError, ToolExecutionContext, ToolExecutionResult, ToolInvocation, ToolRuntimeHooks,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl TurnHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _user_input: &str) {
        metrics::counter!("weft_turn_start_total").increment(1);
    }

    fn on_tool_call(&self, _session_id: &SessionId, _call_id: &str, tool_name: &str) {
        metrics::counter!(
            "weft_turn_tool_call_total",
            "tool_name" => tool_name.to_string()
        )
        .increment(1);
    }

    fn on_turn_complete(&self, _session_id: &SessionId, message: &ChatMessage) {
        metrics::counter!("weft_turn_complete_total").increment(1);
        metrics::histogram!("weft_turn_tool_calls_per_turn")
            .record(message.tool_calls.len() as f64);
    }

    fn on_turn_failed(&self, _session_id: &SessionId, error: &ChatError) {
        metrics::counter!(
            "weft_turn_failed_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, invocation: &ToolInvocation, _context: &ToolExecutionContext) {
        metrics::counter!(
            "weft_tool_execution_start_total",
            "tool_name" => invocation.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        invocation: &ToolInvocation,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "weft_tool_execution_success_total",
            "tool_name" => invocation.name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "weft_tool_execution_duration_seconds",
            "tool_name" => invocation.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        invocation: &ToolInvocation,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "weft_tool_execution_failure_total",
            "tool_name" => invocation.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "weft_tool_execution_duration_seconds",
            "tool_name" => invocation.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}
