//! Observer seam for the tool execution lifecycle.
//!
//! ```rust
//! use wtooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! let hooks: Box<dyn ToolRuntimeHooks> = Box::new(NoopToolRuntimeHooks);
//! let _ = hooks;
//! ```

use std::time::Duration;

use crate::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolInvocation};

/// Callbacks fired by a runtime around each tool invocation. Every method
/// defaults to a no-op so implementors only override the phases they care
/// about. Callbacks must not block; the runtime calls them inline.
pub trait ToolRuntimeHooks: Send + Sync {
    /// Fired after lookup and argument validation succeed, immediately
    /// before the tool future is polled.
    fn on_execution_start(&self, _invocation: &ToolInvocation, _context: &ToolExecutionContext) {}

    /// Fired once the tool resolves with output.
    fn on_execution_success(
        &self,
        _invocation: &ToolInvocation,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
    }

    /// Fired for every failure path, including lookup misses, rejected
    /// arguments, and timeouts.
    fn on_execution_failure(
        &self,
        _invocation: &ToolInvocation,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }
}

/// Hook implementation that observes nothing. The default for runtimes
/// built without an observability layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
