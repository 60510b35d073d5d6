//! The [`Tool`] contract and its closure-backed implementation.
//!
//! ```rust
//! use serde_json::json;
//! use wmodel::ToolDefinition;
//! use wtooling::{FunctionTool, Tool};
//!
//! let echo = FunctionTool::new(
//!     ToolDefinition {
//!         name: "echo".to_string(),
//!         description: "Echoes input".to_string(),
//!         input_schema: json!({"type": "object"}),
//!     },
//!     |args, _ctx| async move { Ok(args) },
//! );
//! assert_eq!(echo.definition().name, "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use wcommon::BoxFuture;
use wmodel::ToolDefinition;

use crate::{ToolError, ToolExecutionContext};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

/// A named capability the model may call. `invoke` receives arguments that
/// have already passed schema validation and returns the JSON value that
/// becomes the tool result.
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn invoke<'a>(
        &'a self,
        arguments: &'a Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;
}

/// [`Tool`] backed by an async closure. The handler takes arguments and
/// context by value so the returned future owns everything it needs.
pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Handler,
}

type Handler = Arc<
    dyn Fn(Value, ToolExecutionContext) -> ToolFuture<'static, Result<Value, ToolError>>
        + Send
        + Sync,
>;

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self {
            definition,
            handler: Arc::new(move |arguments, context| Box::pin(handler(arguments, context))),
        }
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn invoke<'a>(
        &'a self,
        arguments: &'a Value,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        (self.handler)(arguments.clone(), context.clone())
    }
}
