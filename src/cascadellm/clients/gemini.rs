//! Google Gemini through its OpenAI-compatible endpoint.
//!
//! Gemini reports exhausted free-tier quota as `RESOURCE_EXHAUSTED`, which the shared codec maps
//! to [`BackendError::RateLimited`](crate::BackendError::RateLimited).

use std::time::Duration;

use async_trait::async_trait;

use crate::cascadellm::client_wrapper::{ClientWrapper, Message, MessageChunkStream, RequestOptions};
use crate::cascadellm::clients::openai::OpenAIClient;
use crate::cascadellm::error::ClientError;

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

pub struct GeminiClient {
    delegate_client: OpenAIClient,
    pub model: String,
}

// Models used by the bundled chains, plus the current general availability tiers
pub enum Model {
    Gemini25FlashLite,
    Gemini25Flash,
    Gemini25Pro,
    Gemini20Flash,
    Gemini20FlashLite,
    Gemini15ProLatest,
    Gemini15Flash,
}

pub fn model_to_string(model: Model) -> String {
    match model {
        Model::Gemini25FlashLite => "gemini-2.5-flash-lite".to_string(),
        Model::Gemini25Flash => "gemini-2.5-flash".to_string(),
        Model::Gemini25Pro => "gemini-2.5-pro".to_string(),
        Model::Gemini20Flash => "gemini-2.0-flash".to_string(),
        Model::Gemini20FlashLite => "gemini-2.0-flash-lite".to_string(),
        Model::Gemini15ProLatest => "gemini-1.5-pro-latest".to_string(),
        Model::Gemini15Flash => "gemini-1.5-flash".to_string(),
    }
}

impl GeminiClient {
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, BASE_URL)
    }

    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// This function is used to create a GeminiClient with a custom base URL
    /// The default base URL is "<https://generativelanguage.googleapis.com/v1beta/openai>"
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        GeminiClient {
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
impl ClientWrapper for GeminiClient {
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
