//! Configuration for cascadellm.
//!
//! Two kinds of configuration live here:
//!
//! * [`BackendConfig`] identifies one concrete backend (provider + model) without holding a
//!   connection. Ordered lists of these describe a fallback chain.
//! * [`ProviderSettings`] carries what the built-in providers need at construction time:
//!   credentials, optional base URL overrides and the request timeout.
//!
//! Users construct both manually; [`ProviderSettings::from_env`] is a convenience for the usual
//! environment-variable setup. No config-file parsing dependencies are required, although
//! `BackendConfig` is serde-enabled so chains can be kept in JSON.
//!
//! # Example
//!
//! ```rust
//! use cascadellm::{BackendConfig, Provider, ProviderSettings};
//!
//! let chain = vec![
//!     BackendConfig::new(Provider::Google, "gemini-2.5-flash-lite"),
//!     BackendConfig::new(Provider::Groq, "llama-3.3-70b-versatile")
//!         .with_display_name("Groq Llama 3.3 70B"),
//! ];
//! assert_eq!(chain[0].display_name(), "google/gemini-2.5-flash-lite");
//!
//! let settings = ProviderSettings::default()
//!     .with_credential(Provider::Groq, "gsk_test")
//!     .with_base_url(Provider::Groq, "http://localhost:8080/v1");
//! assert_eq!(settings.credential(&Provider::Groq), Some("gsk_test"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A text-generation vendor.
///
/// Parsing is case-insensitive and accepts a few aliases (`gemini`, `claude`, `grok`). Names
/// that match no built-in vendor become [`Provider::Custom`]; such providers only resolve if a
/// factory was registered for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    Google,
    OpenAI,
    Groq,
    Anthropic,
    Xai,
    Custom(String),
}

impl Provider {
    /// The built-in vendors, in the order they are registered by default.
    pub const BUILT_IN: [Provider; 5] = [
        Provider::Google,
        Provider::OpenAI,
        Provider::Groq,
        Provider::Anthropic,
        Provider::Xai,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            Provider::Google => "google",
            Provider::OpenAI => "openai",
            Provider::Groq => "groq",
            Provider::Anthropic => "anthropic",
            Provider::Xai => "xai",
            Provider::Custom(name) => name,
        }
    }

    /// Environment variables consulted by [`ProviderSettings::from_env`], most preferred first.
    pub fn credential_env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Google => &["GOOGLE_GENERATIVE_AI_API_KEY", "GEMINI_API_KEY"],
            Provider::OpenAI => &["OPENAI_API_KEY"],
            Provider::Groq => &["GROQ_API_KEY"],
            Provider::Anthropic => &["ANTHROPIC_API_KEY"],
            Provider::Xai => &["XAI_API_KEY"],
            Provider::Custom(_) => &[],
        }
    }

    /// Default OpenAI-compatible base URL of the vendor, if it is a built-in one.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Provider::Google => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Provider::OpenAI => Some("https://api.openai.com/v1"),
            Provider::Groq => Some("https://api.groq.com/openai/v1"),
            Provider::Anthropic => Some("https://api.anthropic.com/v1"),
            Provider::Xai => Some("https://api.x.ai/v1"),
            Provider::Custom(_) => None,
        }
    }
}

impl From<&str> for Provider {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Provider::Google,
            "openai" => Provider::OpenAI,
            "groq" => Provider::Groq,
            "anthropic" | "claude" => Provider::Anthropic,
            "xai" | "grok" => Provider::Xai,
            other => Provider::Custom(other.to_string()),
        }
    }
}

impl From<String> for Provider {
    fn from(name: String) -> Self {
        Provider::from(name.as_str())
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.as_str().to_string()
    }
}

impl FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Provider::from(s))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete backend of a chain: which provider, which model, and how to call it in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub provider: Provider,
    #[serde(rename = "model")]
    pub model_id: String,
    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl BackendConfig {
    pub fn new(provider: Provider, model_id: impl Into<String>) -> Self {
        BackendConfig {
            provider,
            model_id: model_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// The configured display name, or `provider/model` when none was given.
    pub fn display_name(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => format!("{}/{}", self.provider, self.model_id),
        }
    }

    /// Parse an ordered chain from a JSON array of `{"provider", "model", "displayName"?}`.
    pub fn chain_from_json(json: &str) -> Result<Vec<BackendConfig>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Settings used by the built-in provider factories.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    credentials: HashMap<Provider, String>,
    base_urls: HashMap<Provider, String>,
    http_client: Option<reqwest::Client>,
    /// Upper bound for one HTTP request, streaming requests included.
    pub request_timeout: Duration,
}

impl Default for ProviderSettings {
    /// No credentials, vendor base URLs, and a 300 second request timeout.
    fn default() -> Self {
        ProviderSettings {
            credentials: HashMap::new(),
            base_urls: HashMap::new(),
            http_client: None,
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl ProviderSettings {
    /// Read credentials for every built-in provider from the process environment.
    ///
    /// Empty variables are treated as absent.
    pub fn from_env() -> Self {
        let mut settings = ProviderSettings::default();
        for provider in Provider::BUILT_IN.iter() {
            let found = provider
                .credential_env_vars()
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|value| !value.trim().is_empty());
            if let Some(secret) = found {
                settings.credentials.insert(provider.clone(), secret);
            }
        }
        settings
    }

    pub fn with_credential(mut self, provider: Provider, secret: impl Into<String>) -> Self {
        self.credentials.insert(provider, secret.into());
        self
    }

    pub fn with_base_url(mut self, provider: Provider, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(provider, base_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Route built-in vendors through `http` instead of the process wide pool.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http_client = Some(http);
        self
    }

    pub fn http_client(&self) -> Option<&reqwest::Client> {
        self.http_client.as_ref()
    }

    pub fn credential(&self, provider: &Provider) -> Option<&str> {
        self.credentials.get(provider).map(String::as_str)
    }

    /// Override if one was set, otherwise the vendor default.
    pub fn base_url(&self, provider: &Provider) -> Option<String> {
        self.base_urls
            .get(provider)
            .cloned()
            .or_else(|| provider.default_base_url().map(str::to_string))
    }
}
