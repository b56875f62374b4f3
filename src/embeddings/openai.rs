// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI-compatible embedding producer client
//!
//! Calls `{base_url}/embeddings` with a fixed model name. Batched requests are
//! sent as a single call; responses are reordered by the producer's `index`
//! field so output order always matches input order.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::cache::EmbeddingCache;
use super::provider::EmbeddingProvider;
use crate::rag::errors::RagError;
use crate::vector::Embedding;

/// Configuration for the embedding producer endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub cache_enabled: bool,
    pub cache_ttl_seconds: i64,
}

impl Default for EmbeddingApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 30,
            cache_enabled: true,
            cache_ttl_seconds: 3600,
        }
    }
}

/// Embedding producer backed by an OpenAI-compatible REST endpoint
pub struct OpenAiEmbeddings {
    config: EmbeddingApiConfig,
    client: Client,
    cache: Option<EmbeddingCache>,
}

impl OpenAiEmbeddings {
    pub fn new(config: EmbeddingApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        let cache = if config.cache_enabled {
            Some(EmbeddingCache::new(config.cache_ttl_seconds))
        } else {
            None
        };

        Self {
            config,
            client,
            cache,
        }
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Embedding>, RagError> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let request = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagError::EmbeddingProducer {
                        status: 0,
                        message: format!(
                            "request timed out after {}s",
                            self.config.timeout_secs
                        ),
                    }
                } else {
                    RagError::EmbeddingProducer {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match status.as_u16() {
                429 => "rate limit exceeded".to_string(),
                401 | 403 => "authentication failed - check the API key".to_string(),
                _ => response.text().await.unwrap_or_default(),
            };
            return Err(RagError::EmbeddingProducer {
                status: status.as_u16(),
                message,
            });
        }

        let data: EmbeddingsResponse =
            response
                .json()
                .await
                .map_err(|e| RagError::EmbeddingProducer {
                    status: 0,
                    message: format!("JSON parse error: {}", e),
                })?;

        // The index field is authoritative for ordering
        let mut items = data.data;
        items.sort_by_key(|item| item.index);

        if items.len() != texts.len() {
            return Err(RagError::EmbeddingProducer {
                status: 0,
                message: format!(
                    "producer returned {} embeddings for {} inputs",
                    items.len(),
                    texts.len()
                ),
            });
        }

        Ok(items
            .into_iter()
            .map(|item| Embedding::new(item.embedding))
            .collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let Some(cache) = &self.cache else {
            return self.request_embeddings(texts).await;
        };

        let mut results: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut misses: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = EmbeddingCache::cache_key(&self.config.model, text);
            match cache.get(&key).await {
                Some(hit) => results[i] = Some(hit),
                None => misses.push(i),
            }
        }

        if !misses.is_empty() {
            let pending: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            debug!(
                total = texts.len(),
                uncached = pending.len(),
                model = %self.config.model,
                "requesting embeddings"
            );
            let fresh = self.request_embeddings(&pending).await?;

            for (&i, embedding) in misses.iter().zip(fresh.into_iter()) {
                let key = EmbeddingCache::cache_key(&self.config.model, &texts[i]);
                cache.put(key, embedding.clone()).await;
                results[i] = Some(embedding);
            }
        }

        // Every slot is filled: cache hits above, producer results here
        Ok(results.into_iter().flatten().collect())
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    index: usize,
}
