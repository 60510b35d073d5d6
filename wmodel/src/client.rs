//! Completion client contract and request model.
//!
//! ```rust
//! use wmodel::{CompletionRequest, WireMessage};
//!
//! let request = CompletionRequest::new("gpt-4o-mini", vec![WireMessage::user("hi")]);
//! assert!(request.validate().is_ok());
//! ```

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use wcommon::GenerationOptions;

use crate::{BoxedEventStream, CompletionError, WireMessage};

pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A tool offered to the model for this request. `input_schema` is the raw
/// JSON schema as discovered from the tool source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub tools: Vec<ToolDefinition>,
    pub options: GenerationOptions,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<WireMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.options.stream = true;
        self
    }

    pub fn validate(&self) -> Result<(), CompletionError> {
        if self.model.trim().is_empty() {
            return Err(CompletionError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(CompletionError::invalid_request(
                "at least one message is required",
            ));
        }

        if let Some(max_tokens) = self.options.max_tokens
            && max_tokens == 0
        {
            return Err(CompletionError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(CompletionError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}

/// Boundary with the completion model. Implementations submit the serialized
/// history plus offered tools and yield a lazy event sequence for one turn.
pub trait CompletionClient: Send + Sync {
    fn stream<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ClientFuture<'a, Result<BoxedEventStream<'a>, CompletionError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompletionErrorKind;

    #[test]
    fn validate_rejects_blank_model_and_empty_history() {
        let empty_model = CompletionRequest::new("  ", vec![WireMessage::user("hi")]);
        assert_eq!(
            empty_model.validate().unwrap_err().kind,
            CompletionErrorKind::InvalidRequest
        );

        let no_messages = CompletionRequest::new("gpt-4o-mini", Vec::new());
        assert!(no_messages.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_sampling_options() {
        let request = CompletionRequest::new("gpt-4o-mini", vec![WireMessage::user("hi")])
            .with_options(wcommon::GenerationOptions::default().with_temperature(3.5));
        assert!(request.validate().is_err());

        let request = CompletionRequest::new("gpt-4o-mini", vec![WireMessage::user("hi")])
            .with_options(wcommon::GenerationOptions::default().with_max_tokens(0));
        assert!(request.validate().is_err());
    }
}
