//! Backend registry: turns a [`BackendConfig`] into a live [`ClientWrapper`] handle.
//!
//! The registry maps each [`Provider`] to a [`BackendFactory`]. Resolution only builds the
//! handle and checks prerequisites such as a credential being present; no request is sent until
//! the handle is invoked. Every resolution produces a fresh, independent handle.
//!
//! ```rust
//! use std::sync::Arc;
//! use cascadellm::clients::mock::MockClient;
//! use cascadellm::{
//!     BackendConfig, BackendRegistry, ClientWrapper, ConfigurationError, Provider,
//!     ProviderSettings,
//! };
//!
//! let settings = ProviderSettings::default().with_credential(Provider::Groq, "gsk_test");
//! let mut registry = BackendRegistry::from_settings(settings);
//! registry.register(
//!     Provider::from("local"),
//!     |config: &BackendConfig| -> Result<Arc<dyn ClientWrapper>, ConfigurationError> {
//!         Ok(Arc::new(MockClient::new(config.model_id.clone())))
//!     },
//! );
//!
//! let groq = registry
//!     .resolve(&BackendConfig::new(Provider::Groq, "llama-3.1-8b-instant"))
//!     .unwrap();
//! assert_eq!(groq.model_name(), "llama-3.1-8b-instant");
//!
//! let missing = registry.resolve(&BackendConfig::new(Provider::OpenAI, "gpt-4o-mini"));
//! assert!(matches!(missing, Err(ConfigurationError::MissingCredential { .. })));
//!
//! let local = registry.resolve(&BackendConfig::new(Provider::from("local"), "tiny")).unwrap();
//! assert_eq!(local.model_name(), "tiny");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::cascadellm::client_wrapper::ClientWrapper;
use crate::cascadellm::clients::claude::ClaudeClient;
use crate::cascadellm::clients::common::get_shared_http_client;
use crate::cascadellm::clients::gemini::GeminiClient;
use crate::cascadellm::clients::grok::GrokClient;
use crate::cascadellm::clients::groq::GroqClient;
use crate::cascadellm::clients::openai::OpenAIClient;
use crate::cascadellm::config::{BackendConfig, Provider, ProviderSettings};
use crate::cascadellm::error::ConfigurationError;

/// Builds backend handles for one provider.
///
/// Closures `Fn(&BackendConfig) -> Result<Arc<dyn ClientWrapper>, ConfigurationError>`
/// implement this trait, which is the easiest way to plug in custom vendors or test doubles.
pub trait BackendFactory: Send + Sync {
    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn ClientWrapper>, ConfigurationError>;
}

impl<F> BackendFactory for F
where
    F: Fn(&BackendConfig) -> Result<Arc<dyn ClientWrapper>, ConfigurationError> + Send + Sync,
{
    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn ClientWrapper>, ConfigurationError> {
        self(config)
    }
}

/// Factory for the built-in OpenAI-compatible vendors.
struct BuiltInFactory {
    settings: Arc<ProviderSettings>,
}

impl BackendFactory for BuiltInFactory {
    fn create(&self, config: &BackendConfig) -> Result<Arc<dyn ClientWrapper>, ConfigurationError> {
        let provider = &config.provider;
        let secret = self.settings.credential(provider).ok_or_else(|| {
            ConfigurationError::MissingCredential {
                provider: provider.clone(),
                env_var: provider
                    .credential_env_vars()
                    .first()
                    .map(|var| var.to_string())
                    .unwrap_or_else(|| format!("{} credential", provider)),
            }
        })?;
        let base_url = self
            .settings
            .base_url(provider)
            .ok_or_else(|| ConfigurationError::UnknownProvider(provider.to_string()))?;
        let model = config.model_id.as_str();
        let timeout = self.settings.request_timeout;

        let http = self
            .settings
            .http_client()
            .cloned()
            .unwrap_or_else(|| get_shared_http_client().clone());

        let handle: Arc<dyn ClientWrapper> = match provider {
            Provider::Google => Arc::new(
                GeminiClient::new_with_base_url(secret, model, &base_url)
                    .with_timeout(timeout)
                    .with_http_client(http),
            ),
            Provider::OpenAI => Arc::new(
                OpenAIClient::new_with_base_url(secret, model, &base_url)
                    .with_timeout(timeout)
                    .with_http_client(http),
            ),
            Provider::Groq => Arc::new(
                GroqClient::new_with_base_url(secret, model, &base_url)
                    .with_timeout(timeout)
                    .with_http_client(http),
            ),
            Provider::Anthropic => Arc::new(
                ClaudeClient::new_with_base_url(secret, model, &base_url)
                    .with_timeout(timeout)
                    .with_http_client(http),
            ),
            Provider::Xai => Arc::new(
                GrokClient::new_with_base_url(secret, model, &base_url)
                    .with_timeout(timeout)
                    .with_http_client(http),
            ),
            Provider::Custom(name) => return Err(ConfigurationError::UnknownProvider(name.clone())),
        };
        Ok(handle)
    }
}

/// Resolves backend configs to callable handles.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<Provider, Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    /// A registry that knows no provider at all.
    pub fn empty() -> Self {
        BackendRegistry::default()
    }

    /// A registry with the built-in vendors (Google, OpenAI, Groq, Anthropic, xAI).
    pub fn from_settings(settings: ProviderSettings) -> Self {
        let settings = Arc::new(settings);
        let mut registry = BackendRegistry::empty();
        for provider in Provider::BUILT_IN.iter() {
            registry.register(
                provider.clone(),
                BuiltInFactory {
                    settings: Arc::clone(&settings),
                },
            );
        }
        registry
    }

    /// Add or replace the factory used for `provider`.
    pub fn register(
        &mut self,
        provider: Provider,
        factory: impl BackendFactory + 'static,
    ) -> &mut Self {
        self.factories.insert(provider, Arc::new(factory));
        self
    }

    /// Builder flavoured [`BackendRegistry::register`].
    pub fn with_factory(mut self, provider: Provider, factory: impl BackendFactory + 'static) -> Self {
        self.register(provider, factory);
        self
    }

    pub fn supports(&self, provider: &Provider) -> bool {
        self.factories.contains_key(provider)
    }

    /// Build a new handle for `config`.
    pub fn resolve(&self, config: &BackendConfig) -> Result<Arc<dyn ClientWrapper>, ConfigurationError> {
        let factory = self
            .factories
            .get(&config.provider)
            .ok_or_else(|| ConfigurationError::UnknownProvider(config.provider.to_string()))?;
        factory.create(config)
    }
}
