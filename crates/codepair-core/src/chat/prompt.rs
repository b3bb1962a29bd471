//! Prompt assembly.
//!
//! Turns a conversation log into the ordered message list sent to the
//! completion oracle: the system instruction first, then every turn in log
//! order with its role carried over unchanged. Content is passed as plain
//! data, so braces or other template syntax in user text need no escaping.

use codepair_types::config::OracleSettings;
use codepair_types::llm::{CompletionRequest, Message};

use super::log::ConversationLog;

/// Behaviour contract prepended to every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert AI coding assistant. Provide only concise \
    and correct solutions with strategic print statements for debugging. Always respond in \
    English. And if you dont know the answer just tell can't figure it out but dont give \
    incorrect response";

/// Builds oracle messages from a conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAssembler {
    instruction: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(SYSTEM_INSTRUCTION)
    }
}

impl PromptAssembler {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// `[system instruction] ++ log`, role-mapped one to one.
    pub fn assemble(&self, log: &ConversationLog) -> Vec<Message> {
        let mut messages = Vec::with_capacity(log.len() + 1);
        messages.push(Message::system(self.instruction.clone()));
        messages.extend(log.iter().map(Message::from));
        messages
    }

    /// Assemble the messages and wrap them in a request using the session's
    /// fixed oracle settings.
    pub fn request(
        &self,
        log: &ConversationLog,
        settings: &OracleSettings,
        stream: bool,
    ) -> CompletionRequest {
        CompletionRequest {
            model: settings.model.clone(),
            messages: self.assemble(log),
            temperature: Some(settings.temperature),
            format: settings.format,
            stream,
        }
    }
}
