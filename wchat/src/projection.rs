//! Client-visible read model of the in-flight turn.
//!
//! The projection owns the streaming assistant message and applies exactly
//! one mutation per orchestrator event, in event order, so any consumer
//! reading it between events observes a strictly growing, never-retracted
//! view of the turn.

use crate::{ChatMessage, ToolCallRecord, TurnEvent};

/// Shown in place of the assistant text when a turn fails mid-stream.
pub const FAILURE_NOTICE: &str = "Sorry, an error occurred. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnProjection {
    message: ChatMessage,
    finished: bool,
}

impl TurnProjection {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::assistant(message_id),
            finished: false,
        }
    }

    /// The in-flight assistant message as of the last applied event.
    pub fn message(&self) -> &ChatMessage {
        &self.message
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies one event: text deltas append, requested calls append a
    /// record, resolutions attach to their record by call id (a resolution
    /// with no matching record, or a duplicate, is a no-op), terminal events
    /// freeze the message. Events after a terminal one are ignored.
    pub fn apply(&mut self, event: &TurnEvent) {
        if self.finished {
            return;
        }

        match event {
            TurnEvent::TextDelta(delta) => self.message.text.push_str(delta),
            TurnEvent::ToolCallRequested {
                call_id,
                name,
                arguments,
            } => self.message.tool_calls.push(ToolCallRecord::new(
                call_id.clone(),
                name.clone(),
                arguments.clone(),
            )),
            TurnEvent::ToolCallResolved { call_id, outcome } => {
                if let Some(record) = self
                    .message
                    .tool_calls
                    .iter_mut()
                    .find(|record| record.call_id == *call_id)
                {
                    record.attach_result(outcome.clone());
                }
            }
            TurnEvent::TurnComplete => self.finished = true,
            TurnEvent::TurnFailed(_) => {
                self.message.text = FAILURE_NOTICE.to_string();
                self.message.tool_calls.retain(ToolCallRecord::is_resolved);
                self.finished = true;
            }
        }
    }

    /// Yields the finished message for commit to the transcript.
    pub fn into_message(self) -> ChatMessage {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{ChatError, ToolCallOutcome};

    #[test]
    fn text_deltas_accumulate_in_emission_order() {
        let mut projection = TurnProjection::new("msg-2");

        for delta in ["fin", "d th", "em"] {
            projection.apply(&TurnEvent::TextDelta(delta.to_string()));
        }

        assert_eq!(projection.message().text, "find them");
    }

    #[test]
    fn resolution_attaches_once_and_duplicates_are_ignored() {
        let mut projection = TurnProjection::new("msg-2");
        projection.apply(&TurnEvent::ToolCallRequested {
            call_id: "call_1".to_string(),
            name: "get_commerce_offers".to_string(),
            arguments: json!({"query": "running shoes"}),
        });

        projection.apply(&TurnEvent::ToolCallResolved {
            call_id: "call_1".to_string(),
            outcome: ToolCallOutcome::Success(json!({"total": 2})),
        });
        projection.apply(&TurnEvent::ToolCallResolved {
            call_id: "call_1".to_string(),
            outcome: ToolCallOutcome::Failure("late duplicate".to_string()),
        });

        let record = &projection.message().tool_calls[0];
        assert_eq!(
            record.result,
            Some(ToolCallOutcome::Success(json!({"total": 2})))
        );
    }

    #[test]
    fn failure_replaces_text_and_keeps_only_resolved_records() {
        let mut projection = TurnProjection::new("msg-2");
        projection.apply(&TurnEvent::TextDelta("partial answer".to_string()));
        projection.apply(&TurnEvent::ToolCallRequested {
            call_id: "call_1".to_string(),
            name: "get_commerce_offers".to_string(),
            arguments: json!({"query": "a"}),
        });
        projection.apply(&TurnEvent::ToolCallResolved {
            call_id: "call_1".to_string(),
            outcome: ToolCallOutcome::Success(json!({"total": 1})),
        });
        projection.apply(&TurnEvent::ToolCallRequested {
            call_id: "call_2".to_string(),
            name: "get_commerce_offers".to_string(),
            arguments: json!({"query": "b"}),
        });

        projection.apply(&TurnEvent::TurnFailed(ChatError::completion(
            "stream dropped",
        )));

        let message = projection.into_message();
        assert_eq!(message.text, FAILURE_NOTICE);
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].call_id, "call_1");
    }

    #[test]
    fn events_after_a_terminal_event_are_ignored() {
        let mut projection = TurnProjection::new("msg-2");
        projection.apply(&TurnEvent::TextDelta("done".to_string()));
        projection.apply(&TurnEvent::TurnComplete);
        projection.apply(&TurnEvent::TextDelta(" and more".to_string()));

        assert!(projection.is_finished());
        assert_eq!(projection.into_message().text, "done");
    }
}
