//! Failure classification.
//!
//! Vendors report the same underlying condition in very different ways: Groq puts
//! `rate_limit_exceeded` in a nested `code`, Gemini answers `RESOURCE_EXHAUSTED`, OpenAI returns
//! 429 with an `insufficient_quota` message, and a vendor that cannot take a given content type
//! answers with an `invalid_request_error`. Provider adapters capture what they saw as a
//! [`RawFailure`] and convert it into a [`BackendError`] variant exactly once; [`classify`] then
//! only looks at variants.
//!
//! ```rust
//! use cascadellm::{classify, BackendError, ClientError, Disposition, RawFailure};
//!
//! let error = BackendError::from(RawFailure::with_status(429, "slow down"));
//! assert_eq!(error, BackendError::RateLimited("slow down".to_string()));
//! assert_eq!(classify(&ClientError::Backend(error)), Disposition::Retryable);
//!
//! let error = BackendError::from(RawFailure::message("Authentication failed"));
//! assert_eq!(classify(&ClientError::Backend(error)), Disposition::Fatal);
//! ```

use serde_json::Value;

use crate::cascadellm::error::{BackendError, ClientError};

const RATE_LIMIT_MARKERS: [&str; 4] = ["quota", "rate limit", "resource_exhausted", "too many requests"];
const TOKEN_BUDGET_MARKERS: [&str; 3] = ["request too large", "tokens per minute", "tpm"];
const REQUEST_SHAPE_MARKERS: [&str; 2] = ["unsupported content", "invalid_request_error"];

/// What to do after a backend failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Capacity or request-shape problem: the next backend may succeed.
    Retryable,
    /// Switching providers is not expected to help.
    Fatal,
}

/// A vendor failure as observed on the wire, before normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFailure {
    /// HTTP status, when there was a response.
    pub status: Option<u16>,
    /// The vendor's `code` field (numeric codes are kept as their decimal text).
    pub code: Option<String>,
    /// The vendor's `type` or `status` field.
    pub error_type: Option<String>,
    pub message: String,
}

impl RawFailure {
    pub fn message(message: impl Into<String>) -> Self {
        RawFailure {
            message: message.into(),
            ..RawFailure::default()
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        RawFailure {
            status: Some(status),
            message: message.into(),
            ..RawFailure::default()
        }
    }

    /// Build from an HTTP error response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        RawFailure {
            status: Some(status),
            ..RawFailure::from_body(body)
        }
    }

    /// Build from an error payload without a status (HTTP body or SSE event data).
    ///
    /// Understands the OpenAI shape `{"error": {"message", "type", "code"}}`, Gemini's
    /// `[{"error": {"code", "message", "status"}}]` and flat `{"message", "type", "code"}`
    /// objects. Anything else becomes the message verbatim.
    pub fn from_body(body: &str) -> Self {
        let mut failure = RawFailure::message(body.trim());

        let parsed: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(_) => return failure,
        };
        let root = match parsed {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        let error = match root.get("error") {
            Some(nested) if nested.is_object() => nested,
            _ => &root,
        };

        if let Some(message) = error.get("message").and_then(Value::as_str) {
            failure.message = message.to_string();
        }
        failure.code = error.get("code").and_then(value_to_text);
        failure.error_type = error
            .get("type")
            .or_else(|| error.get("status"))
            .and_then(value_to_text);
        failure
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl From<RawFailure> for BackendError {
    fn from(raw: RawFailure) -> Self {
        let message = raw.message.to_lowercase();
        let contains_any = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

        let code_is_429 = raw.code.as_deref().map(str::trim) == Some("429");
        if raw.status == Some(429) || code_is_429 || contains_any(&RATE_LIMIT_MARKERS[..]) {
            return BackendError::RateLimited(raw.message);
        }
        if contains_any(&TOKEN_BUDGET_MARKERS[..]) {
            return BackendError::TokenBudgetExceeded(raw.message);
        }
        let type_is_invalid_request = raw
            .error_type
            .as_deref()
            .map(|t| t.to_lowercase().contains("invalid_request"))
            .unwrap_or(false);
        if contains_any(&REQUEST_SHAPE_MARKERS[..]) || type_is_invalid_request {
            return BackendError::RequestShapeRejected(raw.message);
        }

        match raw.status {
            Some(status) => BackendError::Other(format!("HTTP {}: {}", status, raw.message)),
            None => BackendError::Other(raw.message),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        let raw = RawFailure {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            ..RawFailure::default()
        };
        BackendError::from(raw)
    }
}

/// Decide whether a failed attempt should fall back to the next backend.
pub fn classify(error: &ClientError) -> Disposition {
    match error {
        ClientError::Backend(BackendError::RateLimited(_))
        | ClientError::Backend(BackendError::TokenBudgetExceeded(_))
        | ClientError::Backend(BackendError::RequestShapeRejected(_)) => Disposition::Retryable,
        ClientError::Backend(BackendError::Other(_)) => Disposition::Fatal,
        // a nested chain that only ran out of capacity is itself out of capacity
        ClientError::Exhausted(exhausted) => {
            let all_retryable = !exhausted.attempts.is_empty()
                && exhausted
                    .attempts
                    .iter()
                    .all(|attempt| classify(&attempt.error) == Disposition::Retryable);
            if all_retryable {
                Disposition::Retryable
            } else {
                Disposition::Fatal
            }
        }
        ClientError::Cancelled => Disposition::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascadellm::error::{AttemptRecord, CascadeExhausted};

    fn classify_raw(raw: RawFailure) -> Disposition {
        classify(&ClientError::Backend(BackendError::from(raw)))
    }

    #[test]
    fn test_status_429_is_retryable() {
        for message in &["", "Authentication failed", "whatever the vendor said"] {
            assert_eq!(
                classify_raw(RawFailure::with_status(429, *message)),
                Disposition::Retryable
            );
        }
    }

    #[test]
    fn test_nested_code_429_is_retryable() {
        let raw = RawFailure {
            code: Some("429".to_string()),
            message: "busy".to_string(),
            ..RawFailure::default()
        };
        assert_eq!(
            BackendError::from(raw),
            BackendError::RateLimited("busy".to_string())
        );
    }

    #[test]
    fn test_rate_limit_messages_are_case_insensitive() {
        for message in &[
            "You exceeded your current QUOTA",
            "Rate limit reached for model",
            "RESOURCE_EXHAUSTED",
            "Too Many Requests",
        ] {
            assert!(matches!(
                BackendError::from(RawFailure::message(*message)),
                BackendError::RateLimited(_)
            ));
        }
    }

    #[test]
    fn test_token_budget_messages() {
        for message in &[
            "Request too large for model",
            "Limit 12000 tokens per minute",
            "TPM limit hit",
        ] {
            assert!(matches!(
                BackendError::from(RawFailure::message(*message)),
                BackendError::TokenBudgetExceeded(_)
            ));
        }
    }

    #[test]
    fn test_unsupported_content_is_retryable() {
        assert_eq!(
            classify_raw(RawFailure::message(
                "Invalid request: unsupported content type"
            )),
            Disposition::Retryable
        );
        let raw = RawFailure {
            status: Some(400),
            error_type: Some("invalid_request".to_string()),
            message: "messages[1].content must be a string".to_string(),
            ..RawFailure::default()
        };
        assert!(matches!(
            BackendError::from(raw),
            BackendError::RequestShapeRejected(_)
        ));
    }

    #[test]
    fn test_authentication_failure_is_fatal() {
        assert_eq!(
            classify_raw(RawFailure::message("Authentication failed")),
            Disposition::Fatal
        );
        assert_eq!(
            classify_raw(RawFailure::with_status(401, "Invalid API Key")),
            Disposition::Fatal
        );
    }

    #[test]
    fn test_from_response_parses_openai_shape() {
        let body = r#"{"error":{"message":"Rate limit reached for llama-3.3-70b-versatile","type":"tokens","code":"rate_limit_exceeded"}}"#;
        let raw = RawFailure::from_response(429, body);
        assert_eq!(raw.status, Some(429));
        assert_eq!(
            raw.message,
            "Rate limit reached for llama-3.3-70b-versatile"
        );
        assert_eq!(raw.error_type.as_deref(), Some("tokens"));
        assert_eq!(raw.code.as_deref(), Some("rate_limit_exceeded"));
    }

    #[test]
    fn test_from_response_parses_gemini_shape() {
        let body = r#"[{"error":{"code":429,"message":"Quota exceeded for metric","status":"RESOURCE_EXHAUSTED"}}]"#;
        let raw = RawFailure::from_body(body);
        assert_eq!(raw.status, None);
        assert_eq!(raw.code.as_deref(), Some("429"));
        assert_eq!(raw.error_type.as_deref(), Some("RESOURCE_EXHAUSTED"));
        assert!(matches!(BackendError::from(raw), BackendError::RateLimited(_)));
    }

    #[test]
    fn test_from_response_keeps_unparseable_body() {
        let raw = RawFailure::from_response(502, "<html>Bad Gateway</html>\n");
        assert_eq!(raw.message, "<html>Bad Gateway</html>");
        assert_eq!(
            BackendError::from(raw),
            BackendError::Other("HTTP 502: <html>Bad Gateway</html>".to_string())
        );
    }

    #[test]
    fn test_exhausted_chain_is_retryable_only_when_every_attempt_was() {
        let retryable = AttemptRecord {
            backend: "a".to_string(),
            error: BackendError::RateLimited("429".into()).into(),
        };
        let fatal = AttemptRecord {
            backend: "b".to_string(),
            error: BackendError::Other("boom".into()).into(),
        };

        let capacity_only = ClientError::Exhausted(CascadeExhausted {
            attempts: vec![retryable.clone(), retryable.clone()],
        });
        assert_eq!(classify(&capacity_only), Disposition::Retryable);

        let mixed = ClientError::Exhausted(CascadeExhausted {
            attempts: vec![retryable, fatal],
        });
        assert_eq!(classify(&mixed), Disposition::Fatal);
        assert_eq!(classify(&ClientError::Cancelled), Disposition::Fatal);
    }
}
