//! Name-keyed collection of registered tools.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use wcommon::Registry;
use wmodel::ToolDefinition;

use crate::{FunctionTool, Tool, ToolError, ToolExecutionContext};

/// Holds the tools a runtime can dispatch to, keyed by definition name.
/// Registering under an existing name replaces the previous tool.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.definition().name, Arc::new(tool));
    }

    /// Registers an async closure as a [`FunctionTool`].
    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(Value, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, handler));
    }

    /// Convenience for tools that compute their result without awaiting.
    pub fn register_sync_fn<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(Value, ToolExecutionContext) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        self.register_fn(definition, move |arguments, context| {
            let output = handler(arguments, context);
            async move { output }
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Definitions of every registered tool, in registration order. This is
    /// what a chat layer advertises to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{name} test tool"),
            input_schema: json!({"type": "object", "properties": {}}),
        }
    }

    #[test]
    fn registration_replaces_same_named_tools() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("echo"), |arguments, _| Ok(arguments));
        registry.register_sync_fn(definition("echo"), |_, _| Ok(json!("second")));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
    }

    #[test]
    fn definitions_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["gamma", "alpha", "beta"] {
            registry.register_sync_fn(definition(name), |_, _| Ok(json!(null)));
        }

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, ["gamma", "alpha", "beta"]);
    }
}
