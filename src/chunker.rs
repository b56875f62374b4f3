// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed-size overlapping text chunking
//!
//! Documents are split into character windows before embedding. Overlap keeps
//! sentences that straddle a window boundary retrievable from both sides.

use serde::{Deserialize, Serialize};

use crate::rag::errors::RagError;

/// Chunking parameters, in characters (not tokens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive windows; must be < chunk_size
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfiguration {
                reason: "chunk_size must be greater than zero".to_string(),
            });
        }
        if self.overlap >= self.chunk_size {
            return Err(RagError::InvalidConfiguration {
                reason: format!(
                    "overlap ({}) must be smaller than chunk_size ({})",
                    self.overlap, self.chunk_size
                ),
            });
        }
        Ok(())
    }
}

/// Split text into overlapping windows of `config.chunk_size` characters
///
/// The window start advances by `chunk_size - overlap` each step and stops
/// once it would land at or past the end of the text. Text shorter than one
/// window yields a single chunk; empty text yields none. Offsets are char
/// offsets, so multi-byte text never splits inside a code point.
pub fn split_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>, RagError> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    let stride = config.chunk_size - config.overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += stride;
    }

    Ok(chunks)
}
