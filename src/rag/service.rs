// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document-grounded chat orchestration
//!
//! Wires the retrieval core to the producer clients: upload → chunk →
//! rebuild; chat → empty-corpus check → retrieve → assemble → replace the
//! final user turn → stream completion fragments. Returns plain data and
//! streams; no framework types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::{ChatMessage, ChatProvider, ChatStream, OpenAiChat};
use crate::chunker::{split_text, ChunkingConfig};
use crate::config::RagConfig;
use crate::embeddings::{EmbeddingProvider, OpenAiEmbeddings};
use crate::rag::corpus::{CorpusManager, CorpusStatus, DocumentInfo};
use crate::rag::errors::RagError;
use crate::rag::index::SearchHit;
use crate::rag::prompt::PromptAssembler;
use crate::rag::retrieval::{RetrievalConfig, RetrievalPolicy};

/// How many characters of chunk content a search snippet carries
const SNIPPET_CONTENT_LIMIT: usize = 500;

/// Result of one document upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub document_id: Uuid,
    pub name: String,
    pub chunk_count: usize,
    pub total_chunks: usize,
}

/// One scored hit from the document-search diagnostic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSnippet {
    /// Chunk content, truncated for display
    pub content: String,
    pub similarity_score: f32,
    /// First line of the chunk
    pub snippet: String,
}

impl ScoredSnippet {
    fn from_hit(hit: &SearchHit) -> Self {
        let text = &hit.chunk.text;
        let content = if text.chars().count() > SNIPPET_CONTENT_LIMIT {
            let truncated: String = text.chars().take(SNIPPET_CONTENT_LIMIT).collect();
            format!("{}...", truncated)
        } else {
            text.clone()
        };

        Self {
            content,
            similarity_score: hit.score,
            snippet: text.lines().next().unwrap_or("").to_string(),
        }
    }
}

/// Facade over the retrieval core and the two producer clients
pub struct RagChatService {
    corpus: CorpusManager,
    policy: RetrievalPolicy,
    assembler: PromptAssembler,
    chunking: ChunkingConfig,
    embeddings: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
}

impl RagChatService {
    /// Create a service backed by the OpenAI-compatible reference clients
    pub fn new(config: RagConfig) -> Result<Self, RagError> {
        let embeddings = Arc::new(OpenAiEmbeddings::new(config.embedding.clone()));
        let chat = Arc::new(OpenAiChat::new(config.chat.clone()));
        Self::with_providers(config, embeddings, chat)
    }

    /// Create a service with injected producer implementations
    pub fn with_providers(
        config: RagConfig,
        embeddings: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self {
            corpus: CorpusManager::new(),
            policy: RetrievalPolicy::new(config.retrieval),
            assembler: PromptAssembler::new(),
            chunking: config.chunking,
            embeddings,
            chat,
        })
    }

    /// Chunk a document and add it to the corpus, rebuilding the index
    pub async fn upload_document(
        &self,
        text: &str,
        name: &str,
    ) -> Result<UploadSummary, RagError> {
        let chunks = split_text(text, &self.chunking)?;
        debug!(document = name, chunks = chunks.len(), "document chunked");

        let document = self
            .corpus
            .add(chunks, name, self.embeddings.as_ref())
            .await?;
        let status = self.corpus.status().await;

        info!(
            document = name,
            chunks = document.chunk_count,
            total_chunks = status.chunk_count,
            "document uploaded"
        );
        Ok(UploadSummary {
            document_id: document.id,
            name: document.name,
            chunk_count: document.chunk_count,
            total_chunks: status.chunk_count,
        })
    }

    /// Run retrieval for the final user turn and stream the completion
    ///
    /// The assembled instruction text fully replaces the final turn; earlier
    /// history passes through unmodified. An empty corpus short-circuits to
    /// the onboarding prompt without touching the embedding producer.
    pub async fn chat(
        &self,
        mut messages: Vec<ChatMessage>,
        model: Option<&str>,
    ) -> Result<ChatStream, RagError> {
        let query = match messages.last() {
            Some(turn) => turn.content.clone(),
            None => {
                return Err(RagError::InvalidConfiguration {
                    reason: "chat requires at least one message".to_string(),
                })
            }
        };

        let prompt = if self.corpus.is_empty().await {
            self.assembler.onboarding()
        } else {
            let snapshot = self.corpus.snapshot().await;
            let outcome = self
                .policy
                .retrieve(&query, &snapshot, self.embeddings.as_ref())
                .await?;
            self.assembler.assemble(&outcome)
        };

        if let Some(last) = messages.last_mut() {
            *last = ChatMessage::user(prompt);
        }

        let model = model.unwrap_or_else(|| self.chat.default_model());
        self.chat.stream_chat(messages, model).await
    }

    /// Scored-hit diagnostic over the current corpus
    pub async fn search_documents(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredSnippet>, RagError> {
        let query_vector = self.embeddings.embed_one(query).await?;
        let snapshot = self.corpus.snapshot().await;
        let hits = snapshot.index.search(&query_vector, k)?;
        Ok(hits.iter().map(ScoredSnippet::from_hit).collect())
    }

    pub async fn status(&self) -> CorpusStatus {
        self.corpus.status().await
    }

    pub async fn documents(&self) -> Vec<DocumentInfo> {
        self.corpus.documents().await
    }

    pub async fn clear(&self) {
        self.corpus.clear().await
    }

    pub fn retrieval_config(&self) -> &RetrievalConfig {
        self.policy.config()
    }
}
