// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Corpus bookkeeping and index lifecycle
//!
//! The corpus is the full accumulated chunk sequence across all uploads in a
//! session. Every mutation rebuilds the vector index from the entire corpus
//! in one batched producer call and swaps the new index in atomically, so a
//! concurrent search sees either the fully-old or fully-new index, never a
//! partial one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::embeddings::EmbeddingProvider;
use crate::rag::errors::RagError;
use crate::rag::index::{ChunkInput, VectorIndex};

/// One uploaded document, as registered by the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: Uuid,
    pub name: String,
    pub chunk_count: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Read-only corpus counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStatus {
    pub chunk_count: usize,
    pub document_count: usize,
}

/// Consistent view of the corpus at one instant
///
/// The index handle stays valid for the whole search even if an upload swaps
/// in a replacement concurrently.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    pub index: Arc<VectorIndex>,
    pub documents: Vec<DocumentInfo>,
}

impl CorpusSnapshot {
    pub fn chunk_count(&self) -> usize {
        self.index.size()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

#[derive(Debug)]
struct CorpusState {
    chunks: Vec<ChunkInput>,
    documents: Vec<DocumentInfo>,
    index: Arc<VectorIndex>,
}

impl CorpusState {
    fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            documents: Vec::new(),
            index: Arc::new(VectorIndex::new()),
        }
    }
}

/// Owner of the corpus sequence and the current vector index
///
/// `add` and `clear` serialize on an internal rebuild lock held across the
/// embedding-producer call; reads only take the state lock briefly.
pub struct CorpusManager {
    state: Arc<RwLock<CorpusState>>,
    rebuild_lock: Arc<Mutex<()>>,
}

impl Default for CorpusManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusManager {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CorpusState::empty())),
            rebuild_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append a document's chunks and rebuild the index over the full corpus
    ///
    /// All-or-nothing: a producer failure leaves chunks, registry, and index
    /// untouched. The rebuild embeds every accumulated chunk again; corpus
    /// sizes here make that an acceptable price for never holding a
    /// partially-built index.
    pub async fn add(
        &self,
        chunks: Vec<String>,
        name: &str,
        provider: &dyn EmbeddingProvider,
    ) -> Result<DocumentInfo, RagError> {
        let _rebuild = self.rebuild_lock.lock().await;

        let mut all_chunks = {
            let state = self.state.read().await;
            state.chunks.clone()
        };

        let document = DocumentInfo {
            id: Uuid::new_v4(),
            name: name.to_string(),
            chunk_count: chunks.len(),
            uploaded_at: Utc::now(),
        };

        all_chunks.extend(chunks.into_iter().map(|text| ChunkInput {
            text,
            source_id: name.to_string(),
        }));

        // Embedding calls happen here, outside the state lock
        let index = match VectorIndex::build(&all_chunks, provider).await {
            Ok(index) => index,
            Err(e) => {
                warn!(document = name, error = %e, "index rebuild failed, corpus unchanged");
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        state.chunks = all_chunks;
        state.documents.push(document.clone());
        state.index = Arc::new(index);

        info!(
            document = name,
            chunks = document.chunk_count,
            total_chunks = state.chunks.len(),
            "document added, index rebuilt"
        );
        Ok(document)
    }

    /// Reset the corpus to empty and discard the index
    pub async fn clear(&self) {
        let _rebuild = self.rebuild_lock.lock().await;
        let mut state = self.state.write().await;
        *state = CorpusState::empty();
        info!("corpus cleared");
    }

    pub async fn status(&self) -> CorpusStatus {
        let state = self.state.read().await;
        CorpusStatus {
            chunk_count: state.chunks.len(),
            document_count: state.documents.len(),
        }
    }

    pub async fn documents(&self) -> Vec<DocumentInfo> {
        self.state.read().await.documents.clone()
    }

    /// Clone a consistent index + registry view for one retrieval call
    pub async fn snapshot(&self) -> CorpusSnapshot {
        let state = self.state.read().await;
        CorpusSnapshot {
            index: Arc::clone(&state.index),
            documents: state.documents.clone(),
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.documents.is_empty()
    }
}
