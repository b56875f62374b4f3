// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod chat;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod rag;
pub mod vector;

// Re-export the retrieval core
pub use rag::{
    Chunk, ChunkInput, ConfidenceTier, CorpusManager, CorpusSnapshot, CorpusStatus, DocumentInfo,
    PromptAssembler, RagChatService, RagError, RetrievalConfig, RetrievalOutcome, RetrievalPolicy,
    ScoredSnippet, SearchHit, UploadSummary, VectorIndex, REFUSAL_SENTENCE,
};

// Re-export supporting types callers wire the core with
pub use chat::{ChatApiConfig, ChatFragment, ChatMessage, ChatProvider, ChatStream, OpenAiChat};
pub use chunker::{split_text, ChunkingConfig};
pub use config::RagConfig;
pub use embeddings::{EmbeddingApiConfig, EmbeddingProvider, OpenAiEmbeddings};
pub use vector::Embedding;
