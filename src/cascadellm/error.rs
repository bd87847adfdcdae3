//! Error types shared by every backend and by the fallback cascade.
//!
//! Vendor failures never leave a provider adapter in their native shape. Each adapter
//! normalises what it received into one of the closed [`BackendError`] variants (see
//! [`crate::classifier`]), so the cascade decides between "fall back" and "give up" by matching
//! on a variant instead of re-parsing free text.

use std::fmt;

use thiserror::Error;

use crate::cascadellm::config::Provider;

/// A failure reported by a single backend, already normalised from the vendor's own shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// HTTP 429 or a rate/quota message.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The request does not fit the backend's token budget (request size or tokens per minute).
    #[error("token budget exceeded: {0}")]
    TokenBudgetExceeded(String),
    /// The backend cannot accept this request shape (content type, invalid request).
    #[error("request shape rejected: {0}")]
    RequestShapeRejected(String),
    /// Anything else: authentication, server faults, transport and decoding errors.
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// The human readable detail carried by the variant.
    pub fn detail(&self) -> &str {
        match self {
            BackendError::RateLimited(detail)
            | BackendError::TokenBudgetExceeded(detail)
            | BackendError::RequestShapeRejected(detail)
            | BackendError::Other(detail) => detail,
        }
    }
}

/// One failed attempt against one backend, kept for the lifetime of a single invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    /// Display name of the backend that was tried.
    pub backend: String,
    /// What that backend returned.
    pub error: ClientError,
}

/// Every backend in a chain failed. Attempts are listed in chain order.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeExhausted {
    pub attempts: Vec<AttemptRecord>,
}

impl CascadeExhausted {
    /// Display names of the backends that were tried, in order.
    pub fn backends(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.backend.as_str()).collect()
    }
}

impl fmt::Display for CascadeExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all {} fallback backends failed: ",
            self.attempts.len()
        )?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} ({})", attempt.backend, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CascadeExhausted {}

/// The error type of every [`ClientWrapper`](crate::ClientWrapper) call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// A single backend failed. Fatal failures in a cascade surface as exactly this value.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A fallback chain ran out of backends.
    #[error(transparent)]
    Exhausted(#[from] CascadeExhausted),
    /// The caller cancelled the invocation.
    #[error("invocation cancelled")]
    Cancelled,
}

/// A configured backend could not be instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{env_var} is not set, cannot use provider {provider}")]
    MissingCredential { provider: Provider, env_var: String },
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// No backend of a fallback chain could be instantiated, so no client can be produced.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no backend in the fallback chain could be initialised ({} skipped)", .skipped.len())]
pub struct EmptyChainError {
    /// Display name and reason for each configured backend that was dropped.
    pub skipped: Vec<(String, ConfigurationError)>,
}
