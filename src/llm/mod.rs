//! Language model boundary

pub mod claude;

pub use claude::{fallback_answer, ClaudeClient, LlmError};
