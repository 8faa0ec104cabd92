//! askmenu library
//!
//! Retrieval-augmented question answering over restaurant menus.
//!
//! # Modules
//!
//! - `core`: menu text chunking
//! - `search`: embedding, chunk store, ranking, retrieval engine
//! - `llm`: Anthropic Messages client and the no-key fallback answer

pub mod core;
pub mod llm;
pub mod search;

// Re-exports for convenience
pub use crate::core::chunk::split_menu_text;
pub use llm::{fallback_answer, ClaudeClient, LlmError};
pub use search::{
    build_context, cosine_similarity, embed, AskScope, MenuEngine, MenuStore, RetrievalMode,
    ScoredChunk, CONTEXT_CHUNK_CAP, EMBEDDING_DIM,
};
