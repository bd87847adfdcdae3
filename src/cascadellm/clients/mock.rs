//! Scripted in-memory backend for testing.
//!
//! A [`MockClient`] answers from a queue of scripted outcomes and records every call it
//! receives, so tests can assert how often (and with which payload) a backend of a fallback
//! chain was invoked without any network access. Several mocks can share a journal to check the
//! order in which a chain visited them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;

use crate::cascadellm::client_wrapper::{
    ClientWrapper, Message, MessageChunk, MessageChunkStream, RequestOptions, Role,
};
use crate::cascadellm::error::{BackendError, ClientError};

/// Shared, ordered record of which mock was called.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// A backend that replays scripted outcomes.
///
/// Each call (generate or stream) consumes the next scripted outcome; once the script runs out
/// the client keeps answering `"{name} response"`. A successful stream yields the response text
/// word by word, the last chunk carrying `finish_reason = "stop"`.
pub struct MockClient {
    name: String,
    script: Mutex<VecDeque<Result<String, ClientError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
    journal: Option<Journal>,
    latency: Option<Duration>,
}

impl MockClient {
    pub fn new(name: impl Into<String>) -> Self {
        MockClient {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            journal: None,
            latency: None,
        }
    }

    /// Queue a successful response.
    pub fn respond_with(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Queue a failure.
    pub fn fail_with(self, error: impl Into<ClientError>) -> Self {
        self.push(Err(error.into()));
        self
    }

    /// Append the mock's name to `journal` on every call.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Sleep before answering, to simulate a slow vendor.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of calls received so far, generate and stream combined.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Payloads of all calls received so far, in order.
    pub fn received(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, outcome: Result<String, ClientError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    async fn next_outcome(&self, messages: &[Message]) -> Result<String, ClientError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(self.name.clone());
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| Ok(format!("{} response", self.name)))
    }
}

/// Split a response into the chunks a streaming vendor would have sent.
fn into_chunks(content: &str) -> Vec<Result<MessageChunk, ClientError>> {
    let words: Vec<&str> = content.split_inclusive(' ').collect();
    let last = words.len().saturating_sub(1);
    let mut chunks: Vec<Result<MessageChunk, ClientError>> = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            Ok(MessageChunk {
                content: word.to_string(),
                finish_reason: if i == last {
                    Some("stop".to_string())
                } else {
                    None
                },
            })
        })
        .collect();
    if chunks.is_empty() {
        chunks.push(Ok(MessageChunk {
            content: String::new(),
            finish_reason: Some("stop".to_string()),
        }));
    }
    chunks
}

#[async_trait]
impl ClientWrapper for MockClient {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn send_message(
        &self,
        messages: &[Message],
        _options: &RequestOptions,
    ) -> Result<Message, ClientError> {
        let content = self.next_outcome(messages).await?;
        Ok(Message::new(Role::Assistant, content))
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        _options: &RequestOptions,
    ) -> Result<MessageChunkStream, ClientError> {
        let content = self.next_outcome(messages).await?;
        Ok(Box::pin(stream::iter(into_chunks(&content))))
    }
}

/// A mock failure that classifies as exhausted capacity.
pub fn rate_limited() -> BackendError {
    BackendError::RateLimited("429 Too Many Requests".to_string())
}
