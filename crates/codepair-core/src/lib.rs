//! Conversation logic for codepair.
//!
//! This crate defines the conversation log, the prompt assembler, the turn
//! controller, and the `LlmProvider` port that the infrastructure layer
//! implements. It depends only on `codepair-types` -- never on
//! `codepair-infra` or any HTTP crate.

pub mod chat;
pub mod llm;
