//! Conversation turn and turn-cycle state types for codepair.
//!
//! A `Turn` is one role-tagged entry in a session's conversation log.
//! `TurnState` names the phases a single user submission passes through.

use serde::{Deserialize, Serialize};

use std::fmt;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

use crate::llm::Message;

/// One role-tagged entry in the conversation log.
///
/// Fields are private: a turn cannot be edited after it is created, and the
/// log only ever hands out shared references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: MessageRole,
    content: String,
}

impl Turn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the turn carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Message::new(turn.role, turn.content.clone())
    }
}

/// Phase of a single submission cycle.
///
/// `Idle -> UserAppended -> Assembling -> AwaitingOracle -> ResponseAppended -> Idle`.
/// A failure in `Assembling` or `AwaitingOracle` returns straight to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    UserAppended,
    Assembling,
    AwaitingOracle,
    ResponseAppended,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::Idle => write!(f, "idle"),
            TurnState::UserAppended => write!(f, "user_appended"),
            TurnState::Assembling => write!(f, "assembling"),
            TurnState::AwaitingOracle => write!(f, "awaiting_oracle"),
            TurnState::ResponseAppended => write!(f, "response_appended"),
        }
    }
}
