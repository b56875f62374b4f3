// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat producer interface, streaming relay, and OpenAI-compatible client

pub mod openai;
pub mod provider;
pub mod streaming;

pub use openai::{ChatApiConfig, OpenAiChat};
pub use provider::{ChatMessage, ChatProvider};
pub use streaming::{ChatFragment, ChatStream};
