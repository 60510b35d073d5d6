//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use wmodel::{CompletionError, CompletionErrorKind};
use wtooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Completion,
    Tooling,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn completion(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Completion, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn history(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::History, message)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<CompletionError> for ChatError {
    fn from(value: CompletionError) -> Self {
        match value.kind {
            CompletionErrorKind::InvalidRequest => ChatError::invalid_request(value.to_string()),
            _ => ChatError::completion(value.to_string()),
        }
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        ChatError::tooling(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_errors_preserve_invalid_request_classification() {
        let invalid: ChatError = CompletionError::invalid_request("bad model").into();
        assert_eq!(invalid.kind, ChatErrorKind::InvalidRequest);

        let transport: ChatError = CompletionError::transport("connection reset").into();
        assert_eq!(transport.kind, ChatErrorKind::Completion);
    }

    #[test]
    fn tool_errors_map_to_tooling_kind() {
        let error: ChatError = ToolError::execution("backend down").into();
        assert_eq!(error.kind, ChatErrorKind::Tooling);
        assert!(error.message.contains("backend down"));
    }
}
