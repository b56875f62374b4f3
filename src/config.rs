// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crate-level configuration
//!
//! Plain structs with defaults, overridable from `FABSTIR_RAG_*` environment
//! variables. API keys fall back to `OPENAI_API_KEY` so one variable can
//! drive both producer clients.

use std::env;

use crate::chat::ChatApiConfig;
use crate::chunker::ChunkingConfig;
use crate::embeddings::EmbeddingApiConfig;
use crate::rag::errors::RagError;
use crate::rag::retrieval::RetrievalConfig;

/// Top-level configuration for the retrieval core and producer clients
#[derive(Debug, Clone, Default)]
pub struct RagConfig {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingApiConfig,
    pub chat: ChatApiConfig,
}

impl RagConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to the defaults. A `.env`
    /// file in the working directory is honored.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let api_key = env::var("FABSTIR_RAG_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default();

        let chunking = ChunkingConfig {
            chunk_size: env_parse("FABSTIR_RAG_CHUNK_SIZE", ChunkingConfig::default().chunk_size),
            overlap: env_parse("FABSTIR_RAG_CHUNK_OVERLAP", ChunkingConfig::default().overlap),
        };

        let retrieval_defaults = RetrievalConfig::default();
        let retrieval = RetrievalConfig {
            k: env_parse("FABSTIR_RAG_SEARCH_K", retrieval_defaults.k),
            high_threshold: env_parse(
                "FABSTIR_RAG_HIGH_THRESHOLD",
                retrieval_defaults.high_threshold,
            ),
            medium_threshold: env_parse(
                "FABSTIR_RAG_MEDIUM_THRESHOLD",
                retrieval_defaults.medium_threshold,
            ),
            low_threshold: env_parse(
                "FABSTIR_RAG_LOW_THRESHOLD",
                retrieval_defaults.low_threshold,
            ),
            ..retrieval_defaults
        };

        let embedding_defaults = EmbeddingApiConfig::default();
        let embedding = EmbeddingApiConfig {
            base_url: env::var("FABSTIR_RAG_EMBEDDING_BASE_URL")
                .unwrap_or(embedding_defaults.base_url),
            api_key: api_key.clone(),
            model: env::var("FABSTIR_RAG_EMBEDDING_MODEL").unwrap_or(embedding_defaults.model),
            timeout_secs: env_parse(
                "FABSTIR_RAG_EMBEDDING_TIMEOUT_SECS",
                embedding_defaults.timeout_secs,
            ),
            cache_enabled: env::var("FABSTIR_RAG_EMBEDDING_CACHE")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(embedding_defaults.cache_enabled),
            cache_ttl_seconds: env_parse(
                "FABSTIR_RAG_EMBEDDING_CACHE_TTL_SECS",
                embedding_defaults.cache_ttl_seconds,
            ),
        };

        let chat_defaults = ChatApiConfig::default();
        let chat = ChatApiConfig {
            base_url: env::var("FABSTIR_RAG_CHAT_BASE_URL").unwrap_or(chat_defaults.base_url),
            api_key,
            model: env::var("FABSTIR_RAG_CHAT_MODEL").unwrap_or(chat_defaults.model),
            max_tokens: env::var("FABSTIR_RAG_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(chat_defaults.max_tokens),
            temperature: env::var("FABSTIR_RAG_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(chat_defaults.temperature),
            connect_timeout_secs: env_parse(
                "FABSTIR_RAG_CHAT_CONNECT_TIMEOUT_SECS",
                chat_defaults.connect_timeout_secs,
            ),
        };

        Self {
            chunking,
            retrieval,
            embedding,
            chat,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RagError> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
