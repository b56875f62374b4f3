// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) retrieval core
// Chunk corpus bookkeeping, exact cosine search, and confidence-tiered
// prompt assembly for document-grounded chat

pub mod corpus;
pub mod errors;
pub mod index;
pub mod prompt;
pub mod retrieval;
pub mod service;

pub use corpus::{CorpusManager, CorpusSnapshot, CorpusStatus, DocumentInfo};
pub use errors::RagError;
pub use index::{Chunk, ChunkInput, SearchHit, VectorIndex};
pub use prompt::{PromptAssembler, REFUSAL_SENTENCE};
pub use retrieval::{
    is_meta_query, ConfidenceTier, RetrievalConfig, RetrievalOutcome, RetrievalPolicy,
    META_QUERY_PHRASES,
};
pub use service::{RagChatService, ScoredSnippet, UploadSummary};
