//! The cascade loop shared by generation and streaming.
//!
//! [`attempt`] walks a chain of backends in order and hands each one to the caller supplied
//! `invoke` closure, so both call shapes of [`FallbackClient`](crate::FallbackClient) run through
//! the exact same control flow. The first success is returned as is. A failure is recorded and
//! classified: retryable failures move on to the next backend, fatal ones are returned unchanged,
//! and a failure of the last backend turns the recorded attempts into a
//! [`ClientError::Exhausted`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cascadellm::classifier::{classify, Disposition};
use crate::cascadellm::client_wrapper::ClientWrapper;
use crate::cascadellm::error::{AttemptRecord, CascadeExhausted, ClientError};
use crate::cascadellm::fallback::BackendInstance;

/// The call shape an invocation uses. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Generate,
    Stream,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Generate => f.write_str("generate"),
            OperationKind::Stream => f.write_str("stream"),
        }
    }
}

/// Run one logical operation against `chain`, falling back on retryable failures.
///
/// Every backend is tried at most once, strictly one after the other. When `cancel` fires the
/// in-flight attempt is dropped and [`ClientError::Cancelled`] is returned without trying any
/// further backend.
pub async fn attempt<T, F, Fut>(
    chain: &[BackendInstance],
    kind: OperationKind,
    cancel: Option<&CancellationToken>,
    mut invoke: F,
) -> Result<T, ClientError>
where
    F: FnMut(Arc<dyn ClientWrapper>) -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let invocation = Uuid::new_v4();
    let total = chain.len();
    let mut attempts: Vec<AttemptRecord> = Vec::new();

    for (index, backend) in chain.iter().enumerate() {
        if cancel.map_or(false, |token| token.is_cancelled()) {
            log::info!("[{}] {} cancelled before trying {}", invocation, kind, backend.display_name);
            return Err(ClientError::Cancelled);
        }

        log::info!(
            "[{}] {}/{} trying {} ({})",
            invocation,
            index + 1,
            total,
            backend.display_name,
            kind
        );

        let call = invoke(Arc::clone(&backend.handle));
        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ClientError::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        };

        let error = match outcome {
            Ok(value) => {
                if index > 0 {
                    log::info!(
                        "[{}] served by fallback backend {} after {} failed attempt(s)",
                        invocation,
                        backend.display_name,
                        attempts.len()
                    );
                }
                return Ok(value);
            }
            Err(ClientError::Cancelled) => {
                log::info!("[{}] {} cancelled while waiting on {}", invocation, kind, backend.display_name);
                return Err(ClientError::Cancelled);
            }
            Err(error) => error,
        };

        let disposition = classify(&error);
        attempts.push(AttemptRecord {
            backend: backend.display_name.clone(),
            error: error.clone(),
        });

        if index + 1 == total {
            for record in &attempts {
                log::error!("[{}]   {} failed: {}", invocation, record.backend, record.error);
            }
            log::error!("[{}] all {} backends failed", invocation, total);
            return Err(CascadeExhausted { attempts }.into());
        }

        match disposition {
            Disposition::Retryable => {
                log::warn!(
                    "[{}] {} unavailable ({}), falling back to {}",
                    invocation,
                    backend.display_name,
                    error,
                    chain[index + 1].display_name
                );
            }
            Disposition::Fatal => {
                log::error!("[{}] {} failed: {}", invocation, backend.display_name, error);
                return Err(error);
            }
        }
    }

    // Only an empty chain gets here; FallbackClient never builds one.
    Err(CascadeExhausted { attempts }.into())
}
