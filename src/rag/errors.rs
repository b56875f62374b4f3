// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the retrieval core
//!
//! Covers the failure modes of the pipeline:
//! - Configuration errors (bad chunk/overlap parameters)
//! - Dimension mismatches (model drift between index build and query)
//! - External producer failures (embedding and chat services)

use thiserror::Error;

/// Errors surfaced by the retrieval core and its producer adapters
#[derive(Error, Debug)]
pub enum RagError {
    /// Caller supplied invalid chunking or retrieval parameters
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Vector dimensionality differs from the index's fixed dimensionality
    #[error("Dimension mismatch: expected {expected}D, got {actual}D")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The external embedding producer failed (network/auth/rate-limit)
    #[error("Embedding producer error (status {status}): {message}")]
    EmbeddingProducer { status: u16, message: String },

    /// The external chat producer failed before or during streaming
    #[error("Chat producer error: {message}")]
    ChatProducer { message: String },
}

impl RagError {
    /// Get user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            RagError::InvalidConfiguration { reason } => {
                format!("Configuration error: {}", reason)
            }
            RagError::DimensionMismatch { expected, actual } => {
                format!(
                    "Embedding model mismatch: the index holds {}D vectors but the query produced {}D",
                    expected, actual
                )
            }
            RagError::EmbeddingProducer { message, .. } => {
                format!("Embedding service unavailable: {}", message)
            }
            RagError::ChatProducer { message } => {
                format!("Chat service unavailable: {}", message)
            }
        }
    }

    /// Get error code for logging and metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            RagError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            RagError::EmbeddingProducer { .. } => "EMBEDDING_PRODUCER_ERROR",
            RagError::ChatProducer { .. } => "CHAT_PRODUCER_ERROR",
        }
    }

    /// Check if this error originates outside the process
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            RagError::EmbeddingProducer { .. } | RagError::ChatProducer { .. }
        )
    }
}
