// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fragment relay for streamed completions
//!
//! The chat producer yields incremental text fragments; the core relays them
//! verbatim, in order, without buffering. The stream is finite and
//! non-restartable; channel closure is the end-of-stream marker.

use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One relayed fragment of a streamed completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatFragment {
    /// Incremental completion text
    Content(String),
    /// Producer failed mid-stream; the stream terminates after this
    Error(String),
}

/// Stream of completion fragments backed by an mpsc channel
#[derive(Debug)]
pub struct ChatStream {
    receiver: mpsc::Receiver<ChatFragment>,
}

impl ChatStream {
    pub fn new(receiver: mpsc::Receiver<ChatFragment>) -> Self {
        Self { receiver }
    }

    /// Drain the stream, concatenating content; returns the first error too
    pub async fn collect_text(mut self) -> (String, Option<String>) {
        let mut text = String::new();
        let mut error = None;
        while let Some(fragment) = self.receiver.recv().await {
            match fragment {
                ChatFragment::Content(content) => text.push_str(&content),
                ChatFragment::Error(message) => {
                    error.get_or_insert(message);
                }
            }
        }
        (text, error)
    }
}

impl Stream for ChatStream {
    type Item = ChatFragment;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
