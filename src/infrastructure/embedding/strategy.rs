//! Embedding strategy selected once at start-up

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tracing::warn;

use super::HashEmbeddingProvider;
use crate::domain::embedding::EmbeddingProvider;

/// Where an embedding vector came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    Primary,
    Fallback,
}

impl EmbeddingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// An embedding together with its source
#[derive(Debug, Clone)]
pub struct Embedded {
    pub vector: Vec<f32>,
    pub source: EmbeddingSource,
}

/// How the service obtains embeddings
///
/// `Primary` calls an external provider under a timeout and falls back to
/// hashing on failure, timeout or a wrong-sized vector. `FallbackOnly` hashes
/// every input. Either way `embed` always yields a vector of `dimensions()`.
#[derive(Debug, Clone)]
pub enum EmbeddingStrategy {
    Primary {
        provider: Arc<dyn EmbeddingProvider>,
        fallback: HashEmbeddingProvider,
        timeout: Duration,
    },
    FallbackOnly(HashEmbeddingProvider),
}

impl EmbeddingStrategy {
    /// Use `provider`, falling back to a hash embedder of the same dimensionality
    pub fn primary(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        let fallback = HashEmbeddingProvider::new(provider.dimensions());

        Self::Primary {
            provider,
            fallback,
            timeout,
        }
    }

    /// Hash every input locally
    pub fn fallback_only(dimensions: usize) -> Self {
        Self::FallbackOnly(HashEmbeddingProvider::new(dimensions))
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Self::Primary { fallback, .. } => fallback.dimensions(),
            Self::FallbackOnly(fallback) => fallback.dimensions(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Primary { provider, .. } => provider.provider_name(),
            Self::FallbackOnly(fallback) => fallback.provider_name(),
        }
    }

    /// Embed normalized text; never fails
    pub async fn embed(&self, text: &str) -> Embedded {
        match self {
            Self::Primary {
                provider,
                fallback,
                timeout,
            } => match tokio::time::timeout(*timeout, provider.embed(text)).await {
                Ok(Ok(vector)) if vector.len() == fallback.dimensions() => Embedded {
                    vector,
                    source: EmbeddingSource::Primary,
                },
                Ok(Ok(vector)) => {
                    warn!(
                        provider = provider.provider_name(),
                        got = vector.len(),
                        expected = fallback.dimensions(),
                        "Embedding dimension mismatch, using fallback"
                    );
                    Self::fall_back(fallback, text)
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = provider.provider_name(),
                        "Embedding failed, using fallback: {}",
                        e
                    );
                    Self::fall_back(fallback, text)
                }
                Err(_) => {
                    warn!(
                        provider = provider.provider_name(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Embedding timed out, using fallback"
                    );
                    Self::fall_back(fallback, text)
                }
            },
            Self::FallbackOnly(fallback) => Embedded {
                vector: fallback.embed_text(text),
                source: EmbeddingSource::Fallback,
            },
        }
    }

    fn fall_back(fallback: &HashEmbeddingProvider, text: &str) -> Embedded {
        counter!("geocache_embedding_fallbacks_total").increment(1);

        Embedded {
            vector: fallback.embed_text(text),
            source: EmbeddingSource::Fallback,
        }
    }
}
