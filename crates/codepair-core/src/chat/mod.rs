//! Conversation state and the submission cycle.
//!
//! - `log`: the append-only conversation log
//! - `prompt`: turns a log into the ordered message list sent to the oracle
//! - `session`: the session-scoped owner of a log
//! - `controller`: drives one user submission through the oracle

pub mod controller;
pub mod log;
pub mod prompt;
pub mod session;
