//! The `OpenAIClient` struct implements `ClientWrapper` for OpenAI's Chat Completions API.
//!
//! It is also the transport every other built-in vendor delegates to: Gemini, Groq, Anthropic
//! and xAI all expose an OpenAI-compatible `chat/completions` endpoint, so their clients are thin
//! wrappers that only pick a different base URL.
//!
//! # Example
//!
//! ```rust,no_run
//! use cascadellm::clients::openai::{Model, OpenAIClient};
//! use cascadellm::client_wrapper::{ClientWrapper, Message, RequestOptions, Role};
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT4oMini);
//!
//!     let resp = client
//!         .send_message(
//!             &[
//!                 Message::new(Role::System, "You are an assistant."),
//!                 Message::new(Role::User, "Hello!"),
//!             ],
//!             &RequestOptions::default(),
//!         )
//!         .await
//!         .unwrap();
//!     println!("Assistant: {}", resp.content);
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::cascadellm::client_wrapper::{
    ClientWrapper, Message, MessageChunkStream, RequestOptions, Role,
};
use crate::cascadellm::clients::common::{
    get_shared_http_client, send_chat, send_chat_stream, ChatTarget,
};
use crate::cascadellm::error::ClientError;

/// Default OpenAI REST endpoint.
pub const BASE_URL: &str = "https://api.openai.com/v1";

/// Well known model identifiers of OpenAI's Chat Completions API.
pub enum Model {
    /// `gpt-4o` – Omni model, the quality tier of the premium chain.
    GPT4o,
    /// `gpt-4o-mini` – cost effective GPT-4o derivative, available on the free tier.
    GPT4oMini,
    /// `gpt-4.1` – general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` – reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-4.1-nano` – ultra low cost GPT-4.1 derivative.
    GPT41Nano,
    /// `o4-mini` – low latency reasoning model.
    O4Mini,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT41Nano => "gpt-4.1-nano".to_string(),
        Model::O4Mini => "o4-mini".to_string(),
    }
}

/// Client wrapper for OpenAI's Chat Completions API and compatible endpoints.
///
/// Holds no per-request state, so one instance can serve concurrent calls. HTTP connections come
/// from the pool shared by every client of the process.
pub struct OpenAIClient {
    http: reqwest::Client,
    secret_key: String,
    model: String,
    endpoint: String,
    timeout: Option<Duration>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and [`Model`] variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Construct a new client using the provided API key and explicit model name.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    ///
    /// Requests go to `{base_url}/chat/completions`.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            http: get_shared_http_client().clone(),
            secret_key: secret_key.to_string(),
            model: model_name.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            timeout: None,
        }
    }

    /// Bound every request made by this client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use `http` instead of the shared client, e.g. one with its own proxy settings.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn target(&self) -> ChatTarget<'_> {
        ChatTarget {
            http: &self.http,
            endpoint: &self.endpoint,
            secret_key: &self.secret_key,
            model: &self.model,
            timeout: self.timeout,
        }
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<Message, ClientError> {
        match send_chat(&self.target(), messages, options).await {
            Ok(content) => Ok(Message::new(Role::Assistant, content)),
            Err(err) => {
                if log::log_enabled!(log::Level::Debug) {
                    log::debug!(
                        "OpenAIClient::send_message({}): API error: {}",
                        self.model,
                        err
                    );
                }
                Err(err.into())
            }
        }
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<MessageChunkStream, ClientError> {
        send_chat_stream(&self.target(), messages, options)
            .await
            .map_err(|err| {
                log::debug!(
                    "OpenAIClient::send_message_stream({}): API error: {}",
                    self.model,
                    err
                );
                err.into()
            })
    }
}
