// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TTL cache for embedding responses
//!
//! Keys are SHA-256 over (model, text), so switching models can never serve a
//! vector of the wrong dimensionality.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::vector::Embedding;

#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    cache: Arc<RwLock<HashMap<String, (Embedding, i64)>>>,
    ttl_seconds: i64,
}

impl EmbeddingCache {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl_seconds,
        }
    }

    pub fn cache_key(model: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b"\0");
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub async fn get(&self, key: &str) -> Option<Embedding> {
        let cache = self.cache.read().await;
        if let Some((embedding, timestamp)) = cache.get(key) {
            let now = chrono::Utc::now().timestamp();
            if now - timestamp < self.ttl_seconds {
                return Some(embedding.clone());
            }
        }
        None
    }

    pub async fn put(&self, key: String, embedding: Embedding) {
        let mut cache = self.cache.write().await;
        let timestamp = chrono::Utc::now().timestamp();
        cache.insert(key, (embedding, timestamp));
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}
