use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use wchat::{ChatError, ChatMessage, TurnHooks};
use wcommon::SessionId;
use wtooling::{
    ToolError, ToolExecutionContext, ToolExecutionResult, ToolInvocation, ToolRuntimeHooks,
};

pub struct SafeTurnHooks<H> {
    inner: H,
}

impl<H> SafeTurnHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TurnHooks for SafeTurnHooks<H>
where
    H: TurnHooks,
{
    fn on_turn_start(&self, session_id: &SessionId, user_input: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_start(session_id, user_input)
        }));
    }

    fn on_tool_call(&self, session_id: &SessionId, call_id: &str, tool_name: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_tool_call(session_id, call_id, tool_name)
        }));
    }

    fn on_turn_complete(&self, session_id: &SessionId, message: &ChatMessage) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_complete(session_id, message)
        }));
    }

    fn on_turn_failed(&self, session_id: &SessionId, error: &ChatError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_failed(session_id, error)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, invocation: &ToolInvocation, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(invocation, context)
        }));
    }

    fn on_execution_success(
        &self,
        invocation: &ToolInvocation,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(invocation, context, result, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        invocation: &ToolInvocation,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(invocation, context, error, elapsed)
        }));
    }
}
