// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory vector index with exact k-NN cosine search
//!
//! Stores `(Chunk, Embedding)` pairs in insertion order and scans all of them
//! on every search. Corpus sizes here are single-session document sets, so
//! exactness and simplicity win over approximate-index throughput.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::rag::errors::RagError;
use crate::vector::Embedding;

/// Chunk text plus provenance, before index ids are assigned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkInput {
    pub text: String,
    pub source_id: String,
}

/// Unit of retrieval stored in the index
///
/// `id` is a dense 0-based position assigned at insertion. Ids are not stable
/// across rebuilds; treat them as ephemeral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub source_id: String,
}

/// Result from vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Exact-scan cosine similarity index
///
/// Every stored vector has identical dimensionality, fixed by the first
/// insertion. The index is never mutated during a search; rebuilds construct
/// a fresh instance and swap it in.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<(Chunk, Embedding)>,
    dimension: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `chunks` in one batched producer call
    pub async fn build(
        chunks: &[ChunkInput],
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self, RagError> {
        let mut index = Self::new();
        index.insert_all(chunks, provider).await?;
        Ok(index)
    }

    /// Embed and append chunks; all-or-nothing
    ///
    /// A producer failure, count mismatch, non-finite vector, or dimension
    /// drift leaves the index exactly as it was.
    pub async fn insert_all(
        &mut self,
        chunks: &[ChunkInput],
        provider: &dyn EmbeddingProvider,
    ) -> Result<(), RagError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = provider.embed_many(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(RagError::EmbeddingProducer {
                status: 0,
                message: format!(
                    "producer returned {} embeddings for {} chunks",
                    vectors.len(),
                    chunks.len()
                ),
            });
        }

        let expected = self.dimension.unwrap_or_else(|| vectors[0].dimension());
        for vector in &vectors {
            if !vector.is_finite() {
                return Err(RagError::EmbeddingProducer {
                    status: 0,
                    message: "producer returned a non-finite embedding vector".to_string(),
                });
            }
            if vector.dimension() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.dimension(),
                });
            }
        }

        for (chunk, vector) in chunks.iter().zip(vectors.into_iter()) {
            let id = self.entries.len();
            self.entries.push((
                Chunk {
                    id,
                    text: chunk.text.clone(),
                    source_id: chunk.source_id.clone(),
                },
                vector,
            ));
        }
        self.dimension = Some(expected);

        debug!(
            size = self.entries.len(),
            dimension = expected,
            "vector index updated"
        );
        Ok(())
    }

    /// Exact k-nearest-neighbor search by cosine similarity
    ///
    /// Results are sorted descending by score; equal scores rank by ascending
    /// insertion order. Returns `min(k, size)` hits; an empty index returns
    /// an empty vec for any `k`.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchHit>, RagError> {
        if k == 0 {
            return Err(RagError::InvalidConfiguration {
                reason: "search requires k > 0".to_string(),
            });
        }

        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let dimension = self.dimension.unwrap_or(0);
        if query.dimension() != dimension {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: query.dimension(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|(chunk, vector)| SearchHit {
                chunk: chunk.clone(),
                score: query.cosine_similarity(vector),
            })
            .collect();

        // Stable sort keeps insertion order as the tie-break
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        Ok(hits)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fixed dimensionality, once the first vector is stored
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
