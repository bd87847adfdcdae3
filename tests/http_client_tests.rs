//! Adapter tests against local mock vendor endpoints.

use futures_util::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cascadellm::clients::gemini::GeminiClient;
use cascadellm::clients::openai::OpenAIClient;
use cascadellm::{
    BackendConfig, BackendError, BackendRegistry, ClientError, ClientWrapper, FallbackClient,
    Message, MessageChunk, Provider, ProviderSettings, RequestOptions, Role,
};

fn local_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to create HTTP client")
}

fn openai_client(server: &MockServer) -> OpenAIClient {
    OpenAIClient::new_with_base_url("test-key", "gpt-4o-mini", &format!("{}/v1", server.uri()))
        .with_http_client(local_http_client())
}

fn messages() -> Vec<Message> {
    vec![Message::new(Role::User, "Say hi")]
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test123",
        "object": "chat.completion",
        "created": 1704067200,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
    })
}

fn sse_body(pieces: &[&str]) -> String {
    let mut body = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        let finish = if i + 1 == pieces.len() {
            json!("stop")
        } else {
            serde_json::Value::Null
        };
        let chunk = json!({
            "id": "chatcmpl-test123",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": piece}, "finish_reason": finish}]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn event_stream(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

#[tokio::test]
async fn test_completion_request_and_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Say hi"}],
            "temperature": 0.2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi!")))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions {
        temperature: Some(0.2),
        max_tokens: None,
    };
    let reply = openai_client(&server)
        .send_message(&messages(), &options)
        .await
        .unwrap();

    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(&*reply.content, "hi!");
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "Rate limit reached for gpt-4o-mini",
                "type": "requests",
                "code": "rate_limit_exceeded"
            }
        })))
        .mount(&server)
        .await;

    let err = openai_client(&server)
        .send_message(&messages(), &RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ClientError::Backend(BackendError::RateLimited(
            "Rate limit reached for gpt-4o-mini".to_string()
        ))
    );
}

#[tokio::test]
async fn test_gemini_resource_exhausted_array_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/openai/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!([{
            "error": {
                "code": 429,
                "message": "You exceeded your current quota, please check your plan and billing details.",
                "status": "RESOURCE_EXHAUSTED"
            }
        }])))
        .mount(&server)
        .await;

    let client = GeminiClient::new_with_base_url(
        "test-key",
        "gemini-2.5-flash-lite",
        &format!("{}/v1beta/openai", server.uri()),
    )
    .with_http_client(local_http_client());
    let err = client
        .send_message(&messages(), &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Backend(BackendError::RateLimited(ref detail)) if detail.contains("quota")
    ));
}

#[tokio::test]
async fn test_invalid_request_is_request_shape_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Invalid content type. image_url is only supported by certain models.",
                "type": "invalid_request_error",
                "code": null
            }
        })))
        .mount(&server)
        .await;

    let err = openai_client(&server)
        .send_message(&messages(), &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Backend(BackendError::RequestShapeRejected(_))
    ));
}

#[tokio::test]
async fn test_401_is_fatal_other_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_api_key",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let err = openai_client(&server)
        .send_message(&messages(), &RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ClientError::Backend(BackendError::Other(
            "HTTP 401: Incorrect API key provided".to_string()
        ))
    );
}

#[tokio::test]
async fn test_plain_text_server_error_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = openai_client(&server)
        .send_message(&messages(), &RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ClientError::Backend(BackendError::Other("HTTP 503: upstream unavailable".to_string()))
    );
}

#[tokio::test]
async fn test_stream_parses_server_sent_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(event_stream(sse_body(&["Hel", "lo", "!"])))
        .mount(&server)
        .await;

    let stream = openai_client(&server)
        .send_message_stream(&messages(), &RequestOptions::default())
        .await
        .unwrap();
    let chunks: Vec<MessageChunk> = stream.map(|chunk| chunk.unwrap()).collect().await;

    let text: String = chunks.iter().map(|chunk| chunk.content.as_str()).collect();
    assert_eq!(text, "Hello!");
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn test_stream_error_event_is_yielded_as_item() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {}\n\ndata: {}\n\n",
        json!({"choices": [{"index": 0, "delta": {"content": "partial"}, "finish_reason": null}]}),
        json!({"error": {"message": "Rate limit reached", "type": "tokens"}})
    );
    Mock::given(method("POST"))
        .respond_with(event_stream(body))
        .mount(&server)
        .await;

    let stream = openai_client(&server)
        .send_message_stream(&messages(), &RequestOptions::default())
        .await
        .unwrap();
    let items: Vec<Result<MessageChunk, ClientError>> = stream.collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().content, "partial");
    assert_eq!(
        items[1],
        Err(ClientError::Backend(BackendError::RateLimited(
            "Rate limit reached".to_string()
        )))
    );
}

async fn two_vendor_chain(busy: &MockServer, spare: &MockServer) -> FallbackClient {
    let settings = ProviderSettings::default()
        .with_credential(Provider::Groq, "gsk-test")
        .with_credential(Provider::OpenAI, "sk-test")
        .with_base_url(Provider::Groq, format!("{}/openai/v1", busy.uri()))
        .with_base_url(Provider::OpenAI, format!("{}/v1", spare.uri()))
        .with_http_client(local_http_client());
    let registry = BackendRegistry::from_settings(settings);

    FallbackClient::new(
        &[
            BackendConfig::new(Provider::Groq, "llama-3.3-70b-versatile"),
            BackendConfig::new(Provider::OpenAI, "gpt-4o-mini"),
        ],
        &registry,
    )
    .unwrap()
}

#[tokio::test]
async fn test_cascade_across_two_vendor_endpoints() {
    let busy = MockServer::start().await;
    let spare = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "Rate limit reached for model `llama-3.3-70b-versatile` on tokens per minute (TPM)",
                "type": "tokens",
                "code": "rate_limit_exceeded"
            }
        })))
        .expect(1)
        .mount(&busy)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("served by the spare")))
        .expect(1)
        .mount(&spare)
        .await;

    let client = two_vendor_chain(&busy, &spare).await;
    let reply = client
        .send_message(&messages(), &RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(&*reply.content, "served by the spare");
}

#[tokio::test]
async fn test_streaming_cascade_across_two_vendor_endpoints() {
    let busy = MockServer::start().await;
    let spare = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .expect(1)
        .mount(&busy)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(event_stream(sse_body(&["from ", "spare"])))
        .expect(1)
        .mount(&spare)
        .await;

    let client = two_vendor_chain(&busy, &spare).await;
    let mut stream = client
        .send_message_stream(&messages(), &RequestOptions::default())
        .await
        .unwrap();
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk.unwrap().content);
    }

    assert_eq!(text, "from spare");
}

#[tokio::test]
async fn test_unauthorised_primary_is_not_retried_elsewhere() {
    let busy = MockServer::start().await;
    let spare = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API Key", "type": "authentication_error"}
        })))
        .expect(1)
        .mount(&busy)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&spare)
        .await;

    let client = two_vendor_chain(&busy, &spare).await;
    let err = client
        .send_message(&messages(), &RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ClientError::Backend(BackendError::Other("HTTP 401: Invalid API Key".to_string()))
    );
}
