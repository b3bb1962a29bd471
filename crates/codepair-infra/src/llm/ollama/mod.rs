//! Native Ollama provider implementation.
//!
//! This module provides the [`OllamaProvider`] which implements the
//! [`LlmProvider`](codepair_core::llm::provider::LlmProvider) trait for
//! Ollama's `/api/chat` endpoint, including NDJSON streaming.

pub mod client;
pub mod streaming;
pub mod types;

pub use client::OllamaProvider;
