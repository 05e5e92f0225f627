//! Knowledge-base retrieval for the voice agent.
//!
//! A question goes through one round trip per stage: the embedding service
//! turns it into a vector, the hosted similarity-search procedure returns the
//! top-K matching passages, and the matches are rendered into a delimited
//! text block that is inserted into the LLM's context.
//!
//! The entry point is [`KnowledgeBase::search`], which never fails: missing
//! configuration, empty result sets and transport errors all come back as
//! text the assistant can speak.

pub mod embedder;
pub mod error;
pub mod format;
pub mod knowledge;
pub mod store;

pub use embedder::{Embedder, OpenAiEmbedder};
pub use error::KnowledgeError;
pub use format::{format_references, normalize_content};
pub use knowledge::{
    KnowledgeBase, RetrievalSettings, APOLOGY_MESSAGE, NOT_CONFIGURED_MESSAGE, NO_RESULTS_MESSAGE,
};
pub use store::{MatchRecord, SupabaseStore, VectorStore};
