// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding producer trait

use async_trait::async_trait;

use crate::rag::errors::RagError;
use crate::vector::Embedding;

/// External embedding producer
///
/// One provider instance serves one model, so every vector it returns has the
/// same dimensionality. Producer failures surface as
/// [`RagError::EmbeddingProducer`] and are never retried here.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts in one producer call, preserving input order
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, RagError>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Embedding, RagError> {
        let texts = [text.to_string()];
        let mut embeddings = self.embed_many(&texts).await?;
        embeddings.pop().ok_or_else(|| RagError::EmbeddingProducer {
            status: 0,
            message: "producer returned no embedding for a single-text request".to_string(),
        })
    }

    /// Model identifier the producer is called with
    fn model(&self) -> &str;
}
