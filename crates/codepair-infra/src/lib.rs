//! Infrastructure layer for codepair.
//!
//! Contains implementations of the [`LlmProvider`](codepair_core::llm::provider::LlmProvider)
//! port defined in `codepair-core` (native Ollama and OpenAI-compatible
//! servers) and the `config.toml` loader.

pub mod config;
pub mod llm;
