//! Interactive CLI chat experience for codepair.
//!
//! This module implements the chat loop: streaming oracle responses with
//! markdown rendering, a thinking spinner, the welcome banner, and slash
//! commands. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
