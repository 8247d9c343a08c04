// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider client for deterministic testing.
//!
//! `MockClient` implements `ProviderClient` with pre-configured responses
//! and a call counter, enabling fast, CI-runnable tests without external
//! API calls. The counter is what lets tests assert that a cache hit never
//! reached the wrapped client.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use tally_core::{ProviderClient, TallyError};

/// Outcome queued for one future call.
type QueuedOutcome = Result<Value, String>;

/// A mock provider client that replays pre-configured outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, a
/// default Anthropic-shaped response is returned.
pub struct MockClient {
    outcomes: Arc<Mutex<VecDeque<QueuedOutcome>>>,
    calls: AtomicUsize,
}

impl MockClient {
    /// Create a mock client with an empty outcome queue.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock client pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<Value>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful response.
    pub async fn add_response(&self, response: Value) {
        self.outcomes.lock().await.push_back(Ok(response));
    }

    /// Queue a provider-side failure.
    pub async fn add_error(&self, message: impl Into<String>) {
        self.outcomes.lock().await.push_back(Err(message.into()));
    }

    /// How many times `call` reached this client.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for MockClient {
    async fn call(&self, _request: &Value) -> Result<Value, TallyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.outcomes.lock().await.pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TallyError::Provider {
                message,
                source: None,
            }),
            None => Ok(anthropic_response("claude-haiku-4-5", 10, 20)),
        }
    }
}

/// Build an Anthropic Messages-shaped response with the given usage.
pub fn anthropic_response(model: &str, input_tokens: u64, output_tokens: u64) -> Value {
    json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": [{"type": "text", "text": "mock response"}],
        "stop_reason": "end_turn",
        "usage": {
            "input_tokens": input_tokens,
            "output_tokens": output_tokens
        }
    })
}

/// Build an OpenAI chat-completion-shaped response with the given usage.
pub fn openai_response(model: &str, prompt_tokens: u64, completion_tokens: u64) -> Value {
    json!({
        "id": "chatcmpl_mock",
        "object": "chat.completion",
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "mock response"},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}
