// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat producer trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::streaming::ChatStream;
use crate::rag::errors::RagError;

/// One turn of a conversation, in the producer's wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// External streaming text-generation producer
///
/// Produces a finite, non-restartable fragment stream. A failure before the
/// stream opens is a [`RagError::ChatProducer`]; a mid-stream failure surfaces
/// as a [`super::ChatFragment::Error`] followed by clean termination.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> Result<ChatStream, RagError>;

    /// Model used when the caller does not name one
    fn default_model(&self) -> &str;
}
