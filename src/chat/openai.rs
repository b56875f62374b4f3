// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI-compatible streaming chat client
//!
//! Calls `{base_url}/chat/completions` with `stream: true` and relays SSE
//! `data:` payloads as content fragments. `[DONE]` terminates the stream; a
//! transport failure mid-stream surfaces one error fragment and then
//! terminates.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::provider::{ChatMessage, ChatProvider};
use super::streaming::{ChatFragment, ChatStream};
use crate::rag::errors::RagError;

/// Configuration for the chat producer endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub connect_timeout_secs: u64,
}

impl Default for ChatApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(1000),
            // Low temperature for factual, document-grounded responses
            temperature: Some(0.1),
            connect_timeout_secs: 10,
        }
    }
}

/// Chat producer backed by an OpenAI-compatible REST endpoint
pub struct OpenAiChat {
    config: ChatApiConfig,
    client: Client,
}

impl OpenAiChat {
    pub fn new(config: ChatApiConfig) -> Self {
        // No total timeout: completions stream for as long as they stream
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> Result<ChatStream, RagError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = CompletionRequest {
            model,
            messages: &messages,
            stream: true,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::ChatProducer {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::ChatProducer {
                message: format!("status {}: {}", status.as_u16(), body),
            });
        }

        debug!(model, turns = messages.len(), "completion stream opened");

        let (tx, rx) = mpsc::channel(64);
        let mut bytes = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();

            'relay: loop {
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));

                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].to_string();
                            buffer.drain(..=newline);

                            match parse_sse_line(&line) {
                                SseLine::Content(content) => {
                                    if tx.send(ChatFragment::Content(content)).await.is_err() {
                                        // Caller disconnected; stop reading upstream
                                        break 'relay;
                                    }
                                }
                                SseLine::Done => break 'relay,
                                SseLine::Ignore => {}
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "completion stream failed mid-flight");
                        let _ = tx
                            .send(ChatFragment::Error(format!("Error: {}", e)))
                            .await;
                        break 'relay;
                    }
                    None => break 'relay,
                }
            }
        });

        Ok(ChatStream::new(rx))
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }
}

enum SseLine {
    Content(String),
    Done,
    Ignore,
}

/// Parse one SSE line into a relayable fragment
fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
        return SseLine::Ignore;
    };

    if payload == "[DONE]" {
        return SseLine::Done;
    }

    match serde_json::from_str::<CompletionChunk>(payload) {
        Ok(chunk) => match chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
        {
            Some(content) if !content.is_empty() => SseLine::Content(content),
            _ => SseLine::Ignore,
        },
        // Keep-alives and vendor extensions are not worth killing the stream over
        Err(_) => SseLine::Ignore,
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    delta: CompletionDelta,
}

#[derive(Debug, Deserialize, Default)]
struct CompletionDelta {
    #[serde(default)]
    content: Option<String>,
}
