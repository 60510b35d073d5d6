//! Canonical transcript and its wire serialization.
//!
//! The transcript is the single source of truth for a session's history:
//! append-only from the outside, with the in-flight assistant message mutated
//! only through [`crate::TurnProjection`]. Serialization reproduces every
//! tool call the model made, paired with its result, so the model never
//! re-issues an invocation it has already seen resolved.
//!
//! ```rust
//! use wchat::{ChatMessage, Transcript};
//!
//! let mut transcript = Transcript::new();
//! let id = transcript.next_message_id();
//! transcript.append(ChatMessage::user(id, "find running shoes"));
//!
//! let wire = transcript.serialize().expect("history serializes");
//! assert_eq!(wire.len(), 1);
//! ```

use serde_json::{Value, json};
use wmodel::{WireMessage, WireRole, WireToolCall};

use crate::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// The resolution of one tool call. Failures are ordinary outcomes so a
/// single bad call never invalidates its siblings or the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCallOutcome {
    Success(Value),
    Failure(String),
}

/// Wire marker for failed outcomes. Namespaced so a tool's own success
/// payload cannot collide with it and flip classification on re-parse.
const FAILURE_KEY: &str = "weft::tool_error";

impl ToolCallOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ToolCallOutcome::Failure(_))
    }

    fn wire_content(&self) -> String {
        match self {
            ToolCallOutcome::Success(value) => value.to_string(),
            ToolCallOutcome::Failure(message) => json!({ FAILURE_KEY: message }).to_string(),
        }
    }

    fn from_wire_content(content: &str) -> Self {
        match serde_json::from_str::<Value>(content) {
            Ok(value) => {
                let failure = value
                    .as_object()
                    .filter(|object| object.len() == 1)
                    .and_then(|object| object.get(FAILURE_KEY))
                    .and_then(Value::as_str);

                match failure {
                    Some(message) => ToolCallOutcome::Failure(message.to_string()),
                    None => ToolCallOutcome::Success(value),
                }
            }
            Err(_) => ToolCallOutcome::Success(Value::String(content.to_string())),
        }
    }
}

/// One invocation the assistant initiated within a turn. `result` stays empty
/// until the invocation resolves; attaching is first-write-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRecord {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
    pub result: Option<ToolCallOutcome>,
}

impl ToolCallRecord {
    pub fn new(call_id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
            result: None,
        }
    }

    /// Attaches the outcome unless one is already present. Returns whether
    /// the write took effect; a second attach is a no-op, never an overwrite.
    pub fn attach_result(&mut self, outcome: ToolCallOutcome) -> bool {
        if self.result.is_some() {
            return false;
        }

        self.result = Some(outcome);
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.result.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl ChatMessage {
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ChatRole::User,
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// An empty assistant message, ready to accumulate a streaming turn.
    pub fn assistant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: ChatRole::Assistant,
            text: String::new(),
            tool_calls: Vec::new(),
        }
    }
}

/// Ordered message history for one session. Also the reconciler: `serialize`
/// produces the wire form and `from_wire` re-parses it without losing any
/// callId to result association.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next opaque, stable message id for this transcript.
    pub fn next_message_id(&mut self) -> String {
        self.next_id += 1;
        format!("msg-{}", self.next_id)
    }

    /// Commits a finished message. Streaming mutation happens before this
    /// point; once appended the message is treated as immutable.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serializes the transcript for submission to the completion model.
    ///
    /// A user message becomes one user entry. An assistant message without
    /// tool calls becomes one assistant entry. An assistant message with tool
    /// calls becomes one assistant entry carrying the call descriptors,
    /// followed by one tool-result entry per record in call order. A committed
    /// record without a result breaks the pairing contract and fails the
    /// whole serialization.
    pub fn serialize(&self) -> Result<Vec<WireMessage>, ChatError> {
        let mut wire = Vec::new();

        for message in &self.messages {
            match message.role {
                ChatRole::User => wire.push(WireMessage::user(message.text.clone())),
                ChatRole::Assistant if message.tool_calls.is_empty() => {
                    wire.push(WireMessage::assistant(message.text.clone()));
                }
                ChatRole::Assistant => {
                    let descriptors = message
                        .tool_calls
                        .iter()
                        .map(|record| WireToolCall {
                            id: record.call_id.clone(),
                            name: record.tool_name.clone(),
                            arguments: record.arguments.to_string(),
                        })
                        .collect();

                    wire.push(WireMessage::assistant_with_calls(
                        message.text.clone(),
                        descriptors,
                    ));

                    for record in &message.tool_calls {
                        let outcome = record.result.as_ref().ok_or_else(|| {
                            ChatError::history(format!(
                                "committed message '{}' has unresolved tool call '{}'",
                                message.id, record.call_id
                            ))
                        })?;

                        wire.push(WireMessage::tool_result(
                            record.call_id.clone(),
                            outcome.wire_content(),
                        ));
                    }
                }
            }
        }

        Ok(wire)
    }

    /// Rebuilds a transcript from its wire form, restoring the callId to
    /// result pairing. Tool-result entries must follow the assistant entry
    /// that declared the call they correlate with.
    pub fn from_wire(entries: &[WireMessage]) -> Result<Self, ChatError> {
        let mut transcript = Transcript::new();

        for entry in entries {
            match entry.role {
                WireRole::User => {
                    let id = transcript.next_message_id();
                    transcript.append(ChatMessage::user(id, entry.content.clone()));
                }
                WireRole::Assistant => {
                    let id = transcript.next_message_id();
                    let mut message = ChatMessage::assistant(id);
                    message.text = entry.content.clone();

                    for descriptor in &entry.tool_calls {
                        let arguments =
                            serde_json::from_str(&descriptor.arguments).map_err(|err| {
                                ChatError::history(format!(
                                    "call '{}' carries unparsable arguments: {err}",
                                    descriptor.id
                                ))
                            })?;

                        message.tool_calls.push(ToolCallRecord::new(
                            descriptor.id.clone(),
                            descriptor.name.clone(),
                            arguments,
                        ));
                    }

                    transcript.append(message);
                }
                WireRole::ToolResult => {
                    let call_id = entry.tool_call_id.as_deref().ok_or_else(|| {
                        ChatError::history("tool-result entry is missing its call id")
                    })?;

                    let record = transcript
                        .messages
                        .last_mut()
                        .filter(|message| message.role == ChatRole::Assistant)
                        .and_then(|message| {
                            message
                                .tool_calls
                                .iter_mut()
                                .find(|record| record.call_id == call_id)
                        })
                        .ok_or_else(|| {
                            ChatError::history(format!(
                                "tool result '{call_id}' has no matching call descriptor"
                            ))
                        })?;

                    record.attach_result(ToolCallOutcome::from_wire_content(&entry.content));
                }
            }
        }

        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ChatErrorKind;

    fn resolved_record(call_id: &str, output: Value) -> ToolCallRecord {
        let mut record = ToolCallRecord::new(
            call_id,
            "get_commerce_offers",
            json!({"query": "running shoes"}),
        );
        record.attach_result(ToolCallOutcome::Success(output));
        record
    }

    #[test]
    fn attach_result_is_first_write_wins() {
        let mut record = ToolCallRecord::new("call_1", "echo", json!({}));

        assert!(record.attach_result(ToolCallOutcome::Success(json!({"first": true}))));
        assert!(!record.attach_result(ToolCallOutcome::Failure("late".to_string())));

        assert_eq!(
            record.result,
            Some(ToolCallOutcome::Success(json!({"first": true})))
        );
    }

    #[test]
    fn serialize_pairs_call_descriptors_with_results_in_call_order() {
        let mut transcript = Transcript::new();
        let user_id = transcript.next_message_id();
        transcript.append(ChatMessage::user(user_id, "find running shoes"));

        let assistant_id = transcript.next_message_id();
        let mut assistant = ChatMessage::assistant(assistant_id);
        assistant.text = "Here is what I found.".to_string();
        assistant
            .tool_calls
            .push(resolved_record("call_1", json!({"total": 2})));
        assistant
            .tool_calls
            .push(resolved_record("call_2", json!({"total": 0})));
        transcript.append(assistant);

        let wire = transcript.serialize().expect("serialize");
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0].role, WireRole::User);
        assert_eq!(wire[1].role, WireRole::Assistant);
        assert_eq!(wire[1].tool_calls.len(), 2);
        assert_eq!(wire[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(wire[3].tool_call_id.as_deref(), Some("call_2"));
    }

    #[test]
    fn serialize_fails_hard_on_unresolved_committed_call() {
        let mut transcript = Transcript::new();
        let assistant_id = transcript.next_message_id();
        let mut assistant = ChatMessage::assistant(assistant_id);
        assistant
            .tool_calls
            .push(ToolCallRecord::new("call_1", "echo", json!({})));
        transcript.append(assistant);

        let error = transcript.serialize().expect_err("must fail");
        assert_eq!(error.kind, ChatErrorKind::History);
        assert!(error.message.contains("call_1"));
    }

    #[test]
    fn wire_round_trip_preserves_call_result_association() {
        let mut transcript = Transcript::new();
        let user_id = transcript.next_message_id();
        transcript.append(ChatMessage::user(user_id, "find running shoes"));

        let assistant_id = transcript.next_message_id();
        let mut assistant = ChatMessage::assistant(assistant_id);
        assistant.text = "Searching now.".to_string();
        assistant.tool_calls.push(resolved_record(
            "call_1",
            json!({"offers": ["a", "b"], "total": 2}),
        ));
        let mut failed = ToolCallRecord::new("call_2", "get_commerce_offers", json!({"query": ""}));
        failed.attach_result(ToolCallOutcome::Failure("empty query".to_string()));
        assistant.tool_calls.push(failed);
        transcript.append(assistant);

        let wire = transcript.serialize().expect("serialize");
        let back = Transcript::from_wire(&wire).expect("re-parse");

        let restored = &back.messages()[1];
        assert_eq!(restored.tool_calls.len(), 2);
        assert_eq!(
            restored.tool_calls[0].result,
            Some(ToolCallOutcome::Success(
                json!({"offers": ["a", "b"], "total": 2})
            ))
        );
        assert_eq!(
            restored.tool_calls[1].result,
            Some(ToolCallOutcome::Failure("empty query".to_string()))
        );

        // The restored transcript serializes to the identical wire form.
        assert_eq!(back.serialize().expect("serialize again"), wire);
    }

    #[test]
    fn success_payload_shaped_like_the_failure_marker_stays_a_success() {
        let mut transcript = Transcript::new();
        let assistant_id = transcript.next_message_id();
        let mut assistant = ChatMessage::assistant(assistant_id);
        assistant
            .tool_calls
            .push(resolved_record("call_1", json!({"error": "none today"})));
        transcript.append(assistant);

        let wire = transcript.serialize().expect("serialize");
        let back = Transcript::from_wire(&wire).expect("re-parse");

        assert_eq!(
            back.messages()[0].tool_calls[0].result,
            Some(ToolCallOutcome::Success(json!({"error": "none today"})))
        );
    }

    #[test]
    fn from_wire_rejects_orphaned_tool_result() {
        let entries = vec![
            WireMessage::user("hi"),
            WireMessage::tool_result("call_9", "{}"),
        ];

        let error = Transcript::from_wire(&entries).expect_err("must fail");
        assert_eq!(error.kind, ChatErrorKind::History);
    }

    #[test]
    fn message_ids_are_unique_and_stable() {
        let mut transcript = Transcript::new();
        let first = transcript.next_message_id();
        let second = transcript.next_message_id();

        assert_ne!(first, second);
        assert_eq!(first, "msg-1");
        assert_eq!(second, "msg-2");
    }
}
