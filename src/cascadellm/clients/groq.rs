//! Groq's OpenAI-compatible endpoint.
//!
//! Groq is very fast but has a low tokens-per-minute budget on its free tier and rejects some
//! content types. Both surface as retryable errors ("Request too large", TPM, or
//! `invalid_request_error`).

use std::time::Duration;

use async_trait::async_trait;

use crate::cascadellm::client_wrapper::{ClientWrapper, Message, MessageChunkStream, RequestOptions};
use crate::cascadellm::clients::openai::OpenAIClient;
use crate::cascadellm::error::ClientError;

pub const BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqClient {
    delegate_client: OpenAIClient,
    model: String,
}

pub enum Model {
    Llama3370bVersatile, // 30 RPM on the free tier
    Llama318bInstant,    // lowest latency, small context
    Mixtral8x7b32768,
    Gemma29bIt,
}

pub fn model_to_string(model: Model) -> String {
    match model {
        Model::Llama3370bVersatile => "llama-3.3-70b-versatile".to_string(),
        Model::Llama318bInstant => "llama-3.1-8b-instant".to_string(),
        Model::Mixtral8x7b32768 => "mixtral-8x7b-32768".to_string(),
        Model::Gemma29bIt => "gemma2-9b-it".to_string(),
    }
}

impl GroqClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, BASE_URL)
    }

    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        GroqClient {
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
impl ClientWrapper for GroqClient {
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
