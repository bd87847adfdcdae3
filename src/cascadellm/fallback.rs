//! The fallback facade: one [`ClientWrapper`] backed by a whole chain of backends.
//!
//! A [`FallbackClient`] is built once from an ordered list of [`BackendConfig`] values. Configs
//! that cannot be resolved (missing credential, unknown provider) are dropped with a warning;
//! the remaining backends form an immutable chain that is shared by every invocation. Calls go
//! through [`cascade::attempt`](crate::cascade::attempt), so `send_message` and
//! `send_message_stream` fall back in exactly the same way.
//!
//! ```rust
//! use std::sync::Arc;
//! use cascadellm::clients::mock::{rate_limited, MockClient};
//! use cascadellm::{
//!     BackendConfig, BackendRegistry, ClientWrapper, ConfigurationError, FallbackClient,
//!     Message, Provider, RequestOptions, Role,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = BackendRegistry::empty().with_factory(
//!     Provider::from("mock"),
//!     |config: &BackendConfig| -> Result<Arc<dyn ClientWrapper>, ConfigurationError> {
//!         let mock = MockClient::new(config.model_id.clone());
//!         if config.model_id == "busy" {
//!             return Ok(Arc::new(mock.fail_with(rate_limited())));
//!         }
//!         Ok(Arc::new(mock))
//!     },
//! );
//!
//! let model = FallbackClient::new(
//!     &[
//!         BackendConfig::new(Provider::from("mock"), "busy"),
//!         BackendConfig::new(Provider::from("mock"), "spare"),
//!     ],
//!     &registry,
//! )
//! .unwrap();
//!
//! let reply = model
//!     .send_message(&[Message::new(Role::User, "hello")], &RequestOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(&*reply.content, "spare response");
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::cascadellm::cascade::{self, OperationKind};
use crate::cascadellm::client_wrapper::{ClientWrapper, Message, MessageChunkStream, RequestOptions};
use crate::cascadellm::config::BackendConfig;
use crate::cascadellm::error::{ClientError, EmptyChainError};
use crate::cascadellm::presets::Preset;
use crate::cascadellm::registry::BackendRegistry;

/// A resolved chain entry: the config it came from and the live handle.
#[derive(Clone)]
pub struct BackendInstance {
    pub config: BackendConfig,
    /// Name used in logs and attempt records.
    pub display_name: String,
    pub handle: Arc<dyn ClientWrapper>,
}

impl BackendInstance {
    pub fn new(config: BackendConfig, handle: Arc<dyn ClientWrapper>) -> Self {
        BackendInstance {
            display_name: config.display_name(),
            config,
            handle,
        }
    }
}

impl fmt::Debug for BackendInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendInstance")
            .field("config", &self.config)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// One logical model served by an ordered chain of backends.
///
/// Cloning is cheap and clones share the chain. Concurrent invocations are independent of each
/// other: each keeps its own attempt log.
#[derive(Debug, Clone)]
pub struct FallbackClient {
    chain: Arc<[BackendInstance]>,
    model: String,
}

impl FallbackClient {
    /// Resolve `configs` against `registry`, in order.
    ///
    /// Entries that fail to resolve are skipped. Fails only when no entry is left.
    pub fn new(configs: &[BackendConfig], registry: &BackendRegistry) -> Result<Self, EmptyChainError> {
        let mut instances = Vec::with_capacity(configs.len());
        let mut skipped = Vec::new();

        for config in configs {
            let display_name = config.display_name();
            match registry.resolve(config) {
                Ok(handle) => instances.push(BackendInstance::new(config.clone(), handle)),
                Err(reason) => {
                    log::warn!("skipping fallback backend {}: {}", display_name, reason);
                    skipped.push((display_name, reason));
                }
            }
        }

        if instances.is_empty() {
            log::error!(
                "no fallback backend could be initialised out of {} configured",
                configs.len()
            );
            return Err(EmptyChainError { skipped });
        }
        Self::from_instances(instances).map_err(|_| EmptyChainError { skipped })
    }

    /// Build the chain of a named [`Preset`].
    pub fn from_preset(preset: Preset, registry: &BackendRegistry) -> Result<Self, EmptyChainError> {
        log::debug!("building fallback chain from preset {}", preset);
        Self::new(&preset.configs(), registry)
    }

    /// Wrap already resolved backends.
    pub fn from_instances(instances: Vec<BackendInstance>) -> Result<Self, EmptyChainError> {
        let model = match instances.first() {
            Some(primary) => primary.handle.model_name().to_string(),
            None => return Err(EmptyChainError { skipped: Vec::new() }),
        };
        let chain: Arc<[BackendInstance]> = instances.into();
        log::info!(
            "fallback chain: {}",
            chain
                .iter()
                .map(|backend| backend.display_name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(FallbackClient { chain, model })
    }

    /// The resolved chain, in priority order.
    pub fn chain(&self) -> &[BackendInstance] {
        &self.chain
    }

    pub fn display_names(&self) -> Vec<&str> {
        self.chain
            .iter()
            .map(|backend| backend.display_name.as_str())
            .collect()
    }

    /// [`ClientWrapper::send_message`], aborted with [`ClientError::Cancelled`] once `cancel`
    /// fires.
    pub async fn send_message_with_cancel(
        &self,
        messages: &[Message],
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<Message, ClientError> {
        self.generate(messages, options, Some(cancel)).await
    }

    /// [`ClientWrapper::send_message_stream`] with cancellation.
    ///
    /// Cancelling while the chain is still being walked returns [`ClientError::Cancelled`].
    /// Cancelling after a stream was established ends that stream early.
    pub async fn send_message_stream_with_cancel(
        &self,
        messages: &[Message],
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<MessageChunkStream, ClientError> {
        let stream = self.stream(messages, options, Some(cancel)).await?;
        Ok(Box::pin(stream.take_until(cancel.clone().cancelled_owned())))
    }

    async fn generate(
        &self,
        messages: &[Message],
        options: &RequestOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Message, ClientError> {
        cascade::attempt(&self.chain, OperationKind::Generate, cancel, |backend| async move {
            backend.send_message(messages, options).await
        })
        .await
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &RequestOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<MessageChunkStream, ClientError> {
        cascade::attempt(&self.chain, OperationKind::Stream, cancel, |backend| async move {
            backend.send_message_stream(messages, options).await
        })
        .await
    }
}

#[async_trait]
impl ClientWrapper for FallbackClient {
    /// Model id of the primary backend.
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<Message, ClientError> {
        self.generate(messages, options, None).await
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
        options: &RequestOptions,
    ) -> Result<MessageChunkStream, ClientError> {
        self.stream(messages, options, None).await
    }
}
