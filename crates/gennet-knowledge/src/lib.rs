//! # GenNet Knowledge
//!
//! Small in-memory expert knowledge matcher used to enrich chat prompts.
//!
//! ## Design
//! - **Static table**: records load once at start-up (built-in list or a JSON directory)
//! - **Lexical scoring**: whole-query phrase hits outrank per-word overlap
//! - **Keyword bonus**: extracted acronyms and technical terms add up to one point
//! - **Optional embeddings**: an OpenAI-compatible `/embeddings` server adds semantic hits
//!
//! ## How it works
//! ```text
//! User: "How do I harden my Kubernetes cluster?"
//!   ↓
//! Retriever::search("how do i harden my kubernetes cluster", 3)
//!   ↓ phrase / word overlap (+ cosine similarity)
//! Top 3 snippets
//!   ↓
//! enhance_prompt() → "Expert Knowledge Context: ... User Query: ..."
//! ```

pub mod builtin;
pub mod context;
pub mod embedding;
pub mod loader;
pub mod record;
pub mod retriever;
pub mod search;
pub mod store;

pub use context::{build_context, enhance_prompt};
pub use embedding::{Embedder, OpenAiCompatibleEmbedder};
pub use record::KnowledgeRecord;
pub use retriever::Retriever;
pub use search::{MatchMethod, Relevance, SearchResult};
pub use store::{KnowledgeStats, KnowledgeStore};
