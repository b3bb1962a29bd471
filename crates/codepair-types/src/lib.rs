//! Shared domain types for codepair.
//!
//! This crate contains the core domain types used across the workspace:
//! conversation turns, LLM request/response shapes, oracle settings, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
