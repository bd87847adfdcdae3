//! # cascadellm
//!
//! cascadellm turns several independently configured LLM backends into one logical model.
//!
//! Each backend (Google Gemini, OpenAI, Groq, Anthropic Claude, xAI Grok, or anything you
//! register yourself) is exposed through the [`ClientWrapper`] trait. A [`FallbackClient`]
//! implements the very same trait, so agents and sessions that accept an
//! `Arc<dyn ClientWrapper>` can be handed a fallback chain without noticing the difference.
//!
//! Internally the fallback client walks its chain in priority order. Failures that look like
//! exhausted capacity (HTTP 429, quota and rate-limit messages, token-per-minute budgets) or a
//! request shape the vendor cannot accept move the call on to the next backend. Any other
//! failure is returned immediately, and when the whole chain is used up the caller receives a
//! single [`ClientError::Exhausted`] listing every backend that was tried and why it failed.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use cascadellm::client_wrapper::{ClientWrapper, Message, RequestOptions, Role};
//! use cascadellm::presets::Preset;
//! use cascadellm::{BackendRegistry, FallbackClient, ProviderSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     cascadellm::init_logger();
//!
//!     let registry = BackendRegistry::from_settings(ProviderSettings::from_env());
//!     let model = FallbackClient::from_preset(Preset::Balanced, &registry)?;
//!
//!     let reply = model
//!         .send_message(
//!             &[
//!                 Message::new(Role::System, "You are terse."),
//!                 Message::new(Role::User, "Name three prime numbers."),
//!             ],
//!             &RequestOptions::default(),
//!         )
//!         .await?;
//!
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! [`ClientWrapper::send_message_stream`] cascades exactly like `send_message`. A backend
//! counts as successful once its stream has been accepted; the chunks are then handed to the
//! caller as they arrive.
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use cascadellm::client_wrapper::{ClientWrapper, Message, RequestOptions, Role};
//! use cascadellm::presets::Preset;
//! use cascadellm::{BackendRegistry, FallbackClient, ProviderSettings};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = BackendRegistry::from_settings(ProviderSettings::from_env());
//! let model = FallbackClient::from_preset(Preset::UltraFast, &registry)?;
//!
//! let mut stream = model
//!     .send_message_stream(&[Message::new(Role::User, "Count to five.")], &RequestOptions::default())
//!     .await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.content);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding cascadellm can opt in to `RUST_LOG` driven diagnostics (chain order,
/// attempts, fallbacks) without committing to a logging backend upfront.
///
/// ```rust
/// cascadellm::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        // try_init so that a host application that already installed a logger keeps it
        let _ = env_logger::try_init();
    });
}

pub mod cascadellm;

pub use cascadellm::cascade;
pub use cascadellm::classifier;
pub use cascadellm::classifier::{classify, Disposition, RawFailure};
pub use cascadellm::client_wrapper;
pub use cascadellm::client_wrapper::{
    ClientWrapper, Message, MessageChunk, MessageChunkStream, RequestOptions, Role,
};
pub use cascadellm::clients;
pub use cascadellm::config;
pub use cascadellm::config::{BackendConfig, Provider, ProviderSettings};
pub use cascadellm::error;
pub use cascadellm::error::{
    AttemptRecord, BackendError, CascadeExhausted, ClientError, ConfigurationError,
    EmptyChainError,
};
pub use cascadellm::fallback;
pub use cascadellm::fallback::{BackendInstance, FallbackClient};
pub use cascadellm::presets;
pub use cascadellm::presets::Preset;
pub use cascadellm::registry;
pub use cascadellm::registry::{BackendFactory, BackendRegistry};
