//! Capability layer for registering, discovering, and executing tools.

mod error;
mod hooks;
mod mcp;
mod registry;
mod runtime;
mod schema;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolRuntime, McpClient, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
        ToolExecutionResult, ToolFuture, ToolInvocation, ToolRegistry, ToolRuntime,
        ToolRuntimeHooks,
    };
}

pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use mcp::{McpClient, McpHttpTransport, McpTransport, register_mcp_tools};
pub use registry::ToolRegistry;
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use schema::ParamSchema;
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolExecutionContext, ToolExecutionResult, ToolInvocation};
