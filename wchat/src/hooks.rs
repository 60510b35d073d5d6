//! Turn lifecycle hooks fired by the chat service.
//!
//! ```rust
//! use wchat::{NoopTurnHooks, TurnHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn TurnHooks) {}
//!
//! let hooks = NoopTurnHooks;
//! assert_hooks_trait(&hooks);
//! ```

use wcommon::SessionId;

use crate::{ChatError, ChatMessage};

pub trait TurnHooks: Send + Sync {
    fn on_turn_start(&self, _session_id: &SessionId, _user_input: &str) {}

    fn on_tool_call(&self, _session_id: &SessionId, _call_id: &str, _tool_name: &str) {}

    fn on_turn_complete(&self, _session_id: &SessionId, _message: &ChatMessage) {}

    fn on_turn_failed(&self, _session_id: &SessionId, _error: &ChatError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnHooks;

impl TurnHooks for NoopTurnHooks {}
