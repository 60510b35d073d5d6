//! Tool runtime trait and the default registry-backed executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_timer::Delay;
use futures_util::future::{Either, select};
use wmodel::ToolDefinition;

use crate::{
    NoopToolRuntimeHooks, ParamSchema, ToolError, ToolExecutionContext, ToolExecutionResult,
    ToolFuture, ToolInvocation, ToolRegistry, ToolRuntimeHooks,
};

/// Execution seam used by the orchestrator. `definitions` feeds the set of
/// offered tools for a completion request; `execute` resolves one decoded
/// invocation.
pub trait ToolRuntime: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn execute<'a>(
        &'a self,
        invocation: ToolInvocation,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
    timeout: Option<Duration>,
}

impl DefaultToolRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
            timeout: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    fn execute<'a>(
        &'a self,
        invocation: ToolInvocation,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            let tool = self.registry.get(&invocation.name).ok_or_else(|| {
                ToolError::not_found(format!("tool '{}' is not registered", invocation.name))
                    .with_tool_name(invocation.name.clone())
                    .with_tool_call_id(invocation.call_id.clone())
            })?;

            ParamSchema::interpret(&tool.definition().input_schema)
                .validate(&invocation.arguments)
                .map_err(|error| {
                    error
                        .with_tool_name(invocation.name.clone())
                        .with_tool_call_id(invocation.call_id.clone())
                })?;

            self.hooks.on_execution_start(&invocation, &context);
            let started = Instant::now();

            let invoke = tool.invoke(&invocation.arguments, &context);
            let output = match self.timeout {
                Some(limit) => match select(invoke, Delay::new(limit)).await {
                    Either::Left((output, _)) => output,
                    Either::Right(((), _)) => Err(ToolError::timeout(format!(
                        "tool '{}' exceeded {}ms",
                        invocation.name,
                        limit.as_millis()
                    ))),
                },
                None => invoke.await,
            };

            match output {
                Ok(output) => {
                    let result = ToolExecutionResult::from_invocation(&invocation, output);
                    self.hooks
                        .on_execution_success(&invocation, &context, &result, started.elapsed());
                    Ok(result)
                }
                Err(error) => {
                    let error = error
                        .with_tool_name(invocation.name.clone())
                        .with_tool_call_id(invocation.call_id.clone());
                    self.hooks
                        .on_execution_failure(&invocation, &context, &error, started.elapsed());
                    Err(error)
                }
            }
        })
    }
}
