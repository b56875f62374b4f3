// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt assembly from retrieval outcomes
//!
//! Pure functions of the retrieval result. The assembled text fully replaces
//! the user's final turn before it is forwarded to the chat producer; the
//! rest of the conversation history passes through unmodified.

use crate::rag::retrieval::{ConfidenceTier, RetrievalOutcome};

/// Refusal sentence the model is instructed to use verbatim
pub const REFUSAL_SENTENCE: &str =
    "I don't know - this information is not available in the uploaded documents.";

/// Turns a retrieval outcome into the instruction text sent downstream
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(&self, outcome: &RetrievalOutcome) -> String {
        match outcome {
            RetrievalOutcome::Meta {
                query,
                documents,
                chunk_count,
            } => {
                let mut doc_info = format!(
                    "I have access to {} uploaded document(s):\n",
                    documents.len()
                );
                for doc in documents {
                    doc_info.push_str(&format!("- {}\n", doc.name));
                }
                doc_info.push_str(&format!(
                    "\nTotal document chunks in vector database: {}",
                    chunk_count
                ));

                format!(
                    "I am a document-only assistant with access to the following documents:\n\n\
                     {}\n\n\
                     You asked: {}\n\n\
                     I can only answer questions based on the content of these uploaded documents. \
                     Please ask me specific questions about the information contained in these files.",
                    doc_info, query
                )
            }

            RetrievalOutcome::Match {
                query,
                tier,
                contexts,
                ..
            } => {
                let context_str = contexts
                    .iter()
                    .enumerate()
                    .map(|(i, ctx)| format!("Context {}: {}", i + 1, ctx))
                    .collect::<Vec<_>>()
                    .join("\n\n");

                format!(
                    "You are a document-only assistant. You can ONLY answer questions based on the \
                     following context from uploaded documents. If the information is not in the \
                     context below, you MUST respond with \"{}\"\n\n\
                     Context from uploaded documents ({} confidence):\n\
                     {}\n\n\
                     {}\n\n\
                     Question: {}\n\n\
                     Instructions: Answer ONLY based on the context above. If the answer is not in \
                     the context, respond with \"{}\"",
                    REFUSAL_SENTENCE,
                    tier.label(),
                    context_str,
                    tier_guidance(*tier),
                    query,
                    REFUSAL_SENTENCE
                )
            }

            RetrievalOutcome::NoMatch {
                chunks_searched,
                document_count,
                ..
            } => {
                format!(
                    "{}\n\n\
                     I can only answer questions based on the content of the {} document(s) you've \
                     uploaded ({} chunks searched). Please try rephrasing your question to focus on \
                     topics covered in these documents, or ask about specific sections, concepts, or \
                     details mentioned in the files.",
                    REFUSAL_SENTENCE, document_count, chunks_searched
                )
            }
        }
    }

    /// Message used when no document has ever been uploaded
    ///
    /// The caller checks for an empty corpus before invoking the retrieval
    /// policy at all.
    pub fn onboarding(&self) -> String {
        "I am a document-only assistant, but no documents have been uploaded yet.\n\n\
         Please upload some documents first, then I'll be able to answer questions about \
         their content."
            .to_string()
    }
}

fn tier_guidance(tier: ConfidenceTier) -> &'static str {
    match tier {
        ConfidenceTier::High => {
            "The context above is highly relevant to the question. Answer it confidently \
             from the context."
        }
        ConfidenceTier::Medium => {
            "The context above is only partially relevant to the question. Answer from it, \
             but point out where it may not fully cover what was asked."
        }
        ConfidenceTier::Low => {
            "The context above is only weakly related to the question. Be explicit about \
             that limitation, answer only what the context supports, and invite the user to \
             rephrase the question if it misses the mark."
        }
        ConfidenceTier::None => "",
    }
}
