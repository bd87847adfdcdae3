//! Wire plumbing shared by every OpenAI-compatible vendor.
//!
//! All built-in vendors (OpenAI, Gemini's compatibility endpoint, Groq, Anthropic, xAI) accept the
//! Chat Completions request shape, so a single request/response codec and a single pooled HTTP
//! client serve them all. Vendor failures are normalised into [`BackendError`] here, before they
//! reach the cascade.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::{future, StreamExt};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::cascadellm::classifier::RawFailure;
use crate::cascadellm::client_wrapper::{
    Message, MessageChunk, MessageChunkStream, RequestOptions,
};
use crate::cascadellm::error::{BackendError, ClientError};

lazy_static! {
    /// One connection pool for every backend handle created by this process.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = build_http_client();
}

fn build_http_client() -> reqwest::Client {
    reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|err| {
            log::warn!(
                "cascadellm::clients::common: falling back to a default HTTP client: {}",
                err
            );
            reqwest::Client::new()
        })
}

/// The process wide HTTP client. Cloning it shares the underlying connection pool.
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

/// Where and how to send one chat request.
pub struct ChatTarget<'a> {
    pub http: &'a reqwest::Client,
    pub endpoint: &'a str,
    pub secret_key: &'a str,
    pub model: &'a str,
    pub timeout: Option<Duration>,
}

fn build_request<'a>(
    model: &'a str,
    messages: &'a [Message],
    options: &RequestOptions,
    stream: bool,
) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model,
        messages: messages
            .iter()
            .map(|msg| WireMessage {
                role: msg.role.as_str(),
                content: &msg.content,
            })
            .collect(),
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        stream,
    }
}

async fn post_chat(
    target: &ChatTarget<'_>,
    body: &ChatCompletionRequest<'_>,
) -> Result<reqwest::Response, BackendError> {
    let mut request = target
        .http
        .post(target.endpoint)
        .bearer_auth(target.secret_key)
        .json(body);
    if let Some(timeout) = target.timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let error = BackendError::from(RawFailure::from_response(status.as_u16(), &text));
    log::debug!(
        "cascadellm::clients::common::post_chat({}): {} -> {:?}",
        target.model,
        status,
        error
    );
    Err(error)
}

/// Send a blocking chat request and return the assistant's content.
pub async fn send_chat(
    target: &ChatTarget<'_>,
    messages: &[Message],
    options: &RequestOptions,
) -> Result<String, BackendError> {
    let body = build_request(target.model, messages, options, false);
    let response = post_chat(target, &body).await?;

    let parsed: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|err| BackendError::Other(format!("invalid completion body: {}", err)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| BackendError::Other("completion contained no choices".to_string()))
}

/// Send a streaming chat request.
///
/// Returns once the vendor accepted the request; HTTP level failures are reported here and are
/// eligible for fallback. Failures inside the event stream are yielded as stream items.
pub async fn send_chat_stream(
    target: &ChatTarget<'_>,
    messages: &[Message],
    options: &RequestOptions,
) -> Result<MessageChunkStream, BackendError> {
    let body = build_request(target.model, messages, options, true);
    let response = post_chat(target, &body).await?;

    let chunks = response
        .bytes_stream()
        .eventsource()
        .take_while(|event| {
            let done = matches!(event, Ok(event) if event.data.trim() == "[DONE]");
            future::ready(!done)
        })
        .filter_map(|event| async move {
            match event {
                Ok(event) => parse_chunk(&event.data),
                Err(err) => Some(Err(ClientError::Backend(BackendError::Other(format!(
                    "stream error: {}",
                    err
                ))))),
            }
        });

    Ok(Box::pin(chunks))
}

/// Decode one SSE `data:` payload. Keep-alives and usage-only events yield `None`.
pub(crate) fn parse_chunk(data: &str) -> Option<Result<MessageChunk, ClientError>> {
    if data.trim().is_empty() {
        return None;
    }
    let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(err) => {
            return Some(Err(BackendError::Other(format!(
                "malformed stream chunk: {}",
                err
            ))
            .into()))
        }
    };

    if chunk.error.is_some() {
        return Some(Err(BackendError::from(RawFailure::from_body(data)).into()));
    }

    let choice = chunk.choices.into_iter().next()?;
    let content = choice.delta.content.unwrap_or_default();
    if content.is_empty() && choice.finish_reason.is_none() {
        return None;
    }
    Some(Ok(MessageChunk {
        content,
        finish_reason: choice.finish_reason,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascadellm::client_wrapper::Role;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            Message::new(Role::System, "be brief"),
            Message::new(Role::User, "hi"),
        ];
        let options = RequestOptions {
            temperature: Some(0.5),
            max_tokens: None,
        };
        let body = serde_json::to_value(build_request("gpt-4o-mini", &messages, &options, false))
            .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.5
            })
        );

        let streaming =
            serde_json::to_value(build_request("m", &messages, &RequestOptions::default(), true))
                .unwrap();
        assert_eq!(streaming["stream"], serde_json::json!(true));
    }

    #[test]
    fn test_parse_chunk_variants() {
        let delta = parse_chunk(r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#);
        assert_eq!(
            delta,
            Some(Ok(MessageChunk {
                content: "Hel".to_string(),
                finish_reason: None
            }))
        );

        let last = parse_chunk(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        assert_eq!(
            last,
            Some(Ok(MessageChunk {
                content: String::new(),
                finish_reason: Some("stop".to_string())
            }))
        );

        assert_eq!(parse_chunk(r#"{"choices":[],"usage":{"total_tokens":3}}"#), None);
        assert_eq!(parse_chunk(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), None);

        let failure = parse_chunk(r#"{"error":{"message":"Rate limit reached","type":"tokens"}}"#);
        assert_eq!(
            failure,
            Some(Err(ClientError::Backend(BackendError::RateLimited(
                "Rate limit reached".to_string()
            ))))
        );

        assert!(matches!(parse_chunk("not json"), Some(Err(_))));
    }
}
