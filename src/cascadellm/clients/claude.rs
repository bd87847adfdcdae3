//! Anthropic Claude client wrapper built on the OpenAI-compatible transport.
//!
//! Use this module when you want to call Anthropic's Claude models through the same
//! [`ClientWrapper`] interface used by the rest of the crate, for example as one entry of a
//! fallback chain. The wrapper delegates HTTP concerns to the shared OpenAI implementation, so
//! swapping from OpenAI to Claude only requires a different constructor.
//!
//! # Example
//!
//! ```rust,no_run
//! use cascadellm::client_wrapper::{ClientWrapper, Message, RequestOptions, Role};
//! use cascadellm::clients::claude::{ClaudeClient, Model};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = std::env::var("ANTHROPIC_API_KEY")?;
//!     let client = ClaudeClient::new_with_model_enum(&key, Model::ClaudeSonnet4);
//!     let reply = client
//!         .send_message(
//!             &[Message::new(Role::User, "List three Claude capabilities.")],
//!             &RequestOptions::default(),
//!         )
//!         .await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::cascadellm::client_wrapper::{ClientWrapper, Message, MessageChunkStream, RequestOptions};
use crate::cascadellm::clients::openai::OpenAIClient;
use crate::cascadellm::error::ClientError;

pub const BASE_URL: &str = "https://api.anthropic.com/v1";

/// Client wrapper for Anthropic's Claude API routed through the OpenAI compatible surface.
pub struct ClaudeClient {
    /// Delegated client that handles the HTTP interactions.
    delegate_client: OpenAIClient,
    /// Exposed model name.
    model: String,
}

/// Anthropic Claude models available through the compatibility layer.
pub enum Model {
    /// `claude-opus-4-1` – most capable Opus tier.
    ClaudeOpus41,
    /// `claude-sonnet-4-0` – balanced reasoning + throughput.
    ClaudeSonnet4,
    /// `claude-3-7-sonnet-latest` – previous Sonnet generation.
    ClaudeSonnet37,
    /// `claude-3-5-haiku-latest` – fastest Claude tier.
    ClaudeHaiku35,
}

/// Convert a [`Model`] variant into its public string identifier.
fn model_to_string(model: Model) -> String {
    match model {
        Model::ClaudeOpus41 => "claude-opus-4-1".to_string(),
        Model::ClaudeSonnet4 => "claude-sonnet-4-0".to_string(),
        Model::ClaudeSonnet37 => "claude-3-7-sonnet-latest".to_string(),
        Model::ClaudeHaiku35 => "claude-3-5-haiku-latest".to_string(),
    }
}

impl ClaudeClient {
    /// Create a client from an API key and strongly typed model variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    /// Create a client from an API key and explicit model string.
    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, BASE_URL)
    }

    /// Create a client pointing at a custom Claude-compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        ClaudeClient {
            // we reuse the OpenAIClient for Claude and delegate the calls to it
            delegate_client: OpenAIClient::new_with_base_url(secret_key, model_name, base_url),
            model: model_name.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.delegate_client = self.delegate_client.with_timeout(timeout);
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.delegate_client = self.delegate_client.with_http_client(http);
        self
    }
}

#[async_trait]
impl ClientWrapper for ClaudeClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<Message, ClientError> {
        self.delegate_client.send_message(messages, options).await
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<MessageChunkStream, ClientError> {
        self.delegate_client.send_message_stream(messages, options).await
    }
}
