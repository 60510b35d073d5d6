//! Wire-level transcript entries submitted to the completion model.
//!
//! The completion model only avoids re-issuing tool calls it already made if
//! it sees its own prior call descriptors and their results, so assistant
//! entries carry the full descriptor list and tool-result entries are
//! correlated back by `tool_call_id`.
//!
//! ```rust
//! use wmodel::WireMessage;
//!
//! let entry = WireMessage::user("find running shoes");
//! let json = serde_json::to_string(&entry).expect("wire entries serialize");
//! let back: WireMessage = serde_json::from_str(&json).expect("wire entries parse");
//! assert_eq!(entry, back);
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "tool")]
    ToolResult,
}

/// One call descriptor attached to an assistant wire entry. `arguments` is
/// the serialized JSON string, exactly as the model emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: WireRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: WireRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<WireToolCall>) -> Self {
        Self {
            role: WireRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: WireRole::ToolResult,
            content: output.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}
