//! Session-scoped conversation state.
//!
//! A `ChatSession` owns one conversation log and tracks where the current
//! submission cycle is. Each session has its own log; nothing is shared
//! between sessions and nothing outlives the session.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use codepair_types::chat::TurnState;
use codepair_types::llm::Usage;

use super::log::ConversationLog;

/// The state of one interactive chat session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    model: String,
    log: ConversationLog,
    state: TurnState,
    /// Completed user + assistant exchanges.
    exchange_count: u32,
    total_usage: Usage,
    last_usage: Option<Usage>,
}

impl ChatSession {
    /// Start a session with the default greeting.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_log(model, ConversationLog::default())
    }

    /// Start a session around an existing (seeded) log.
    pub fn with_log(model: impl Into<String>, log: ConversationLog) -> Self {
        Self {
            id: Uuid::now_v7(),
            started_at: Utc::now(),
            model: model.into(),
            log,
            state: TurnState::Idle,
            exchange_count: 0,
            total_usage: Usage::default(),
            last_usage: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn exchange_count(&self) -> u32 {
        self.exchange_count
    }

    pub fn total_usage(&self) -> Usage {
        self.total_usage
    }

    /// Usage reported for the most recent completed exchange.
    pub fn last_usage(&self) -> Option<Usage> {
        self.last_usage
    }

    /// Acknowledge that the caller has redrawn the log after a response,
    /// returning the session to `Idle`.
    pub fn mark_rendered(&mut self) {
        if self.state == TurnState::ResponseAppended {
            self.transition(TurnState::Idle);
        }
    }

    pub(crate) fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }

    pub(crate) fn transition(&mut self, to: TurnState) {
        debug!(session = %self.id, from = %self.state, to = %to, "Turn state transition");
        self.state = to;
    }

    /// Record a completed exchange and its token usage.
    pub(crate) fn record_exchange(&mut self, usage: Usage) {
        self.exchange_count += 1;
        self.total_usage.input_tokens =
            self.total_usage.input_tokens.saturating_add(usage.input_tokens);
        self.total_usage.output_tokens =
            self.total_usage.output_tokens.saturating_add(usage.output_tokens);
        self.last_usage = Some(usage);
    }
}
