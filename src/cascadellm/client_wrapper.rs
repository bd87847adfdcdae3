use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;

use crate::cascadellm::error::{BackendError, ClientError};

/// A ClientWrapper is a wrapper around a specific cloud LLM service, or around a whole chain of
/// them (see [`FallbackClient`](crate::FallbackClient)).
/// It provides a common interface to interact with the LLMs.
/// It does not keep track of the conversation, callers pass the full message list every time.
// src/cascadellm/client_wrapper.rs

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    // set by the developer to steer the model's responses
    User,
    // a message sent by a human user (or app user)
    Assistant, // lets the model know the content was generated as a response to a user message
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: Arc<str>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<Arc<str>>) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }
}

/// Sampling knobs forwarded untouched to whichever backend serves the request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Represents a chunk of a streaming message response.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageChunk {
    /// The incremental content in this chunk.
    pub content: String,
    /// Set on the last chunk of a choice (`stop`, `length`, ...).
    pub finish_reason: Option<String>,
}

/// Lazy, finite sequence of chunks. Each chunk is produced once; the stream cannot be restarted.
pub type MessageChunkStream = Pin<Box<dyn Stream<Item = Result<MessageChunk, ClientError>> + Send>>;

/// Trait defining the interface to interact with various LLM services.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Model identifier sent to the vendor.
    fn model_name(&self) -> &str;

    /// Send a message to the LLM and get a response.
    /// - `messages`: The messages to send in the request.
    async fn send_message(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<Message, ClientError>;

    /// Send a message to the LLM and get a streaming response.
    /// Returns a Stream of MessageChunk items, allowing tokens to be processed as they arrive.
    /// The default implementation reports the request as one this backend cannot serve, which
    /// lets a fallback chain move on to a backend that can.
    async fn send_message_stream(
        &self,
        _messages: &[Message],
        _options: &RequestOptions,
    ) -> Result<MessageChunkStream, ClientError> {
        Err(BackendError::RequestShapeRejected(
            "Streaming not supported by this client".to_string(),
        )
        .into())
    }
}
