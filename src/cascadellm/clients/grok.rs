use std::time::Duration;

use async_trait::async_trait;

use crate::cascadellm::client_wrapper::{ClientWrapper, Message, MessageChunkStream, RequestOptions};
use crate::cascadellm::clients::openai::OpenAIClient;
use crate::cascadellm::error::ClientError;

pub const BASE_URL: &str = "https://api.x.ai/v1";

pub struct GrokClient {
    client: OpenAIClient,
    model: String,
}

pub enum Model {
    Grok4,
    Grok3,
    Grok3Mini, // $0.30/MMT input $0.50/MMT output
    Grok3MiniFast,
}

fn model_to_string(model: Model) -> String {
    match model {
        Model::Grok4 => "grok-4".to_string(),
        Model::Grok3 => "grok-3".to_string(),
        Model::Grok3Mini => "grok-3-mini".to_string(),
        Model::Grok3MiniFast => "grok-3-mini-fast".to_string(),
    }
}

impl GrokClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, BASE_URL)
    }

    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        GrokClient {
            client: OpenAIClient::new_with_base_url(secret_key, model_name, base_url),
            model: model_name.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.client = self.client.with_http_client(http);
        self
    }
}

#[async_trait]
impl ClientWrapper for GrokClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<Message, ClientError> {
        self.client.send_message(messages, options).await
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<MessageChunkStream, ClientError> {
        self.client.send_message_stream(messages, options).await
    }
}
