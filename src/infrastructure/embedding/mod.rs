//! Embedding provider implementations

mod hash;
mod openai;
mod strategy;

pub use hash::HashEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;
pub use strategy::{Embedded, EmbeddingSource, EmbeddingStrategy};
