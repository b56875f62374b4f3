// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Confidence-tiered retrieval policy
//!
//! Classifies search hits into confidence tiers and selects which chunks
//! become context. Higher tiers get narrower context (fewer, more certain
//! chunks); below the floor threshold the policy refuses rather than guesses.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embeddings::EmbeddingProvider;
use crate::rag::corpus::{CorpusSnapshot, DocumentInfo};
use crate::rag::errors::RagError;
use crate::rag::index::SearchHit;

/// Queries about the document collection itself, matched case-insensitively
/// as substrings. These short-circuit retrieval; no vector search runs.
pub const META_QUERY_PHRASES: [&str; 10] = [
    "what documents",
    "which documents",
    "what files",
    "which files",
    "what do you have",
    "what's in your context",
    "what context",
    "available documents",
    "uploaded documents",
    "document list",
];

/// Thresholds and selection caps for tiered retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Hits fetched per search
    pub k: usize,
    pub high_threshold: f32,
    pub medium_threshold: f32,
    /// Floor: hits below this are never used as context
    pub low_threshold: f32,
    pub high_limit: usize,
    pub medium_limit: usize,
    pub low_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 5,
            high_threshold: 0.85,
            medium_threshold: 0.70,
            low_threshold: 0.55,
            high_limit: 3,
            medium_limit: 2,
            low_limit: 1,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), RagError> {
        if self.k == 0 {
            return Err(RagError::InvalidConfiguration {
                reason: "retrieval k must be greater than zero".to_string(),
            });
        }
        if !(self.low_threshold < self.medium_threshold
            && self.medium_threshold < self.high_threshold)
        {
            return Err(RagError::InvalidConfiguration {
                reason: format!(
                    "tier thresholds must be strictly ordered: low ({}) < medium ({}) < high ({})",
                    self.low_threshold, self.medium_threshold, self.high_threshold
                ),
            });
        }
        if self.high_limit == 0 || self.medium_limit == 0 || self.low_limit == 0 {
            return Err(RagError::InvalidConfiguration {
                reason: "tier context limits must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Discrete confidence bucket derived from a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceTier {
    /// Pure function of score against the configured thresholds
    pub fn classify(score: f32, config: &RetrievalConfig) -> Self {
        if score >= config.high_threshold {
            ConfidenceTier::High
        } else if score >= config.medium_threshold {
            ConfidenceTier::Medium
        } else if score >= config.low_threshold {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "HIGH",
            ConfidenceTier::Medium => "MEDIUM",
            ConfidenceTier::Low => "LOW",
            ConfidenceTier::None => "NONE",
        }
    }

    fn context_limit(&self, config: &RetrievalConfig) -> usize {
        match self {
            ConfidenceTier::High => config.high_limit,
            ConfidenceTier::Medium => config.medium_limit,
            ConfidenceTier::Low => config.low_limit,
            ConfidenceTier::None => 0,
        }
    }
}

/// Result of running the retrieval policy for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RetrievalOutcome {
    /// The query asked about the document collection itself
    Meta {
        query: String,
        documents: Vec<DocumentInfo>,
        chunk_count: usize,
    },
    /// At least one hit reached the floor threshold
    Match {
        query: String,
        tier: ConfidenceTier,
        contexts: Vec<String>,
        scores: Vec<f32>,
    },
    /// Nothing relevant enough; a normal outcome, not an error
    NoMatch {
        query: String,
        chunks_searched: usize,
        document_count: usize,
    },
}

/// Tiered retrieval over a corpus snapshot
pub struct RetrievalPolicy {
    config: RetrievalConfig,
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        Self::new(RetrievalConfig::default())
    }
}

impl RetrievalPolicy {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run meta-detection, search, classification, and tier selection
    pub async fn retrieve(
        &self,
        query: &str,
        snapshot: &CorpusSnapshot,
        provider: &dyn EmbeddingProvider,
    ) -> Result<RetrievalOutcome, RagError> {
        self.config.validate()?;

        if is_meta_query(query) {
            debug!(query, "meta-query detected, skipping vector search");
            return Ok(RetrievalOutcome::Meta {
                query: query.to_string(),
                documents: snapshot.documents.clone(),
                chunk_count: snapshot.chunk_count(),
            });
        }

        let query_vector = provider.embed_one(query).await?;
        let hits = snapshot.index.search(&query_vector, self.config.k)?;

        let selected = self.select_best_tier(&hits);
        match selected {
            Some((tier, tier_hits)) => {
                info!(
                    query,
                    tier = tier.label(),
                    selected = tier_hits.len(),
                    top_score = tier_hits.first().map(|h| h.score),
                    "retrieval matched"
                );
                Ok(RetrievalOutcome::Match {
                    query: query.to_string(),
                    tier,
                    contexts: tier_hits.iter().map(|h| h.chunk.text.clone()).collect(),
                    scores: tier_hits.iter().map(|h| h.score).collect(),
                })
            }
            None => {
                info!(
                    query,
                    chunks_searched = snapshot.chunk_count(),
                    top_score = hits.first().map(|h| h.score),
                    "no hit reached the floor threshold"
                );
                Ok(RetrievalOutcome::NoMatch {
                    query: query.to_string(),
                    chunks_searched: snapshot.chunk_count(),
                    document_count: snapshot.document_count(),
                })
            }
        }
    }

    /// Pick the highest tier present among the hits and cap its selection
    fn select_best_tier<'a>(
        &self,
        hits: &'a [SearchHit],
    ) -> Option<(ConfidenceTier, Vec<&'a SearchHit>)> {
        for tier in [
            ConfidenceTier::High,
            ConfidenceTier::Medium,
            ConfidenceTier::Low,
        ] {
            let tier_hits: Vec<&SearchHit> = hits
                .iter()
                .filter(|h| ConfidenceTier::classify(h.score, &self.config) == tier)
                .take(tier.context_limit(&self.config))
                .collect();
            if !tier_hits.is_empty() {
                return Some((tier, tier_hits));
            }
        }
        None
    }
}

/// True if the query matches any meta-query phrase
pub fn is_meta_query(query: &str) -> bool {
    let lowered = query.to_lowercase();
    META_QUERY_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}
