//! Append-only conversation log.
//!
//! Holds the ordered turns of one session. Turns are only ever appended;
//! nothing is edited, removed, or reordered once it is in the log.

use codepair_types::chat::Turn;
use codepair_types::error::ChatError;

/// Greeting every new session starts with.
pub const GREETING: &str = "Hi! I'm DeepSeek. How can I help you code today? 💻";

/// Ordered, append-only record of a session's turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    /// Create a log seeded with a single assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Result<Self, ChatError> {
        let mut log = Self { turns: Vec::new() };
        log.append(Turn::assistant(greeting))?;
        Ok(log)
    }

    /// Append a turn to the end of the log.
    ///
    /// A turn with no visible text is rejected, so the log never holds an
    /// empty entry.
    pub fn append(&mut self, turn: Turn) -> Result<&Turn, ChatError> {
        if turn.is_blank() {
            return Err(ChatError::Validation(format!(
                "{} turn has no content",
                turn.role()
            )));
        }
        let index = self.turns.len();
        self.turns.push(turn);
        Ok(&self.turns[index])
    }

    /// All turns in conversational order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl Default for ConversationLog {
    /// A log seeded with [`GREETING`].
    fn default() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
        }
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepair_types::chat::MessageRole;

    #[test]
    fn test_default_log_is_seeded_with_greeting() {
        let log = ConversationLog::default();
        assert_eq!(log.len(), 1);
        assert_eq!(log.all()[0].role(), MessageRole::Assistant);
        assert_eq!(
            log.all()[0].content(),
            "Hi! I'm DeepSeek. How can I help you code today? 💻"
        );
    }

    #[test]
    fn test_with_greeting_rejects_blank() {
        assert!(ConversationLog::with_greeting("   ").is_err());
        let log = ConversationLog::with_greeting("Hello").unwrap();
        assert_eq!(log.last().unwrap().content(), "Hello");
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = ConversationLog::default();
        log.append(Turn::user("first")).unwrap();
        log.append(Turn::assistant("second")).unwrap();
        log.append(Turn::user("third")).unwrap();

        let contents: Vec<&str> = log.iter().map(|t| t.content()).collect();
        assert_eq!(contents[1..], ["first", "second", "third"]);
    }

    #[test]
    fn test_append_rejects_blank_turns() {
        let mut log = ConversationLog::default();
        let err = log.append(Turn::user("")).unwrap_err();
        assert!(err.is_validation());
        assert!(log.append(Turn::assistant("\n\t ")).is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_append_only_earlier_entries_never_change() {
        let mut log = ConversationLog::default();
        let mut snapshots: Vec<Vec<Turn>> = Vec::new();

        for i in 0..20 {
            let turn = if i % 2 == 0 {
                Turn::user(format!("question {i}"))
            } else {
                Turn::assistant(format!("answer {i}"))
            };
            let before = log.len();
            let _ = log.append(turn);
            // Every third attempt is blank and must be rejected.
            if i % 3 == 0 {
                let _ = log.append(Turn::user(""));
            }
            assert!(log.len() >= before);
            snapshots.push(log.all().to_vec());
        }

        let final_turns = log.all();
        for snapshot in &snapshots {
            assert_eq!(&final_turns[..snapshot.len()], snapshot.as_slice());
        }
    }

    #[test]
    fn test_append_returns_the_stored_turn() {
        let mut log = ConversationLog::default();
        let stored = log.append(Turn::user("print hello world in python")).unwrap();
        assert_eq!(stored.content(), "print hello world in python");
    }
}
