//! Deterministic feature-hashing embedder
//!
//! Never fails and needs no network; used when the primary embedding
//! provider is unavailable. Vectors are not semantically meaningful beyond
//! shared words and character trigrams, but they are reproducible and have
//! the same dimensionality as the primary provider.

use async_trait::async_trait;

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::DomainError;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001b3;

/// Weight of a character trigram relative to a whole token
const TRIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed synchronously; the result is L2-normalized unless `text` has no tokens
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for token in text.split_whitespace() {
            let weight = 1.0 + (token.chars().count() as f32).ln();
            self.add_feature(&mut vector, token.as_bytes(), weight);

            let padded: Vec<char> = format!(" {} ", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, trigram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        l2_normalize(&mut vector);
        vector
    }

    fn add_feature(&self, vector: &mut [f32], bytes: &[u8], weight: f32) {
        let hash = fnv1a_hash(bytes);
        let index = (hash % self.dimensions as u64) as usize;
        // The top bit picks the sign so collisions partly cancel instead of piling up
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };

        vector[index] += sign * weight;
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.embed_text(text))
    }

    fn provider_name(&self) -> &'static str {
        "hash"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();

    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

fn fnv1a_hash(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;

    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    hash
}
