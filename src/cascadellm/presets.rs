//! Named fallback chains.
//!
//! Each preset is a plain list of [`BackendConfig`] values; nothing is resolved or shared until
//! it is handed to [`FallbackClient::from_preset`](crate::FallbackClient::from_preset) or
//! [`FallbackClient::new`](crate::FallbackClient::new). Build one facade at start-up and pass it
//! around, or build one per call site.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::cascadellm::clients::{gemini, groq, openai};
use crate::cascadellm::config::{BackendConfig, Provider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Gemini 2.5 Flash Lite, then Groq Llama 3.3 70B, then OpenAI GPT-4o-mini.
    Balanced,
    /// Lowest latency first: Gemini 2.5 Flash Lite, Groq Llama 3.1 8B Instant, Groq Mixtral.
    UltraFast,
    /// OpenAI GPT-4o first, free tiers behind it.
    Premium,
    /// Exhausts every free tier before touching a paid one.
    FreeTierMax,
    GeminiWithOpenAI,
    OpenAIWithGemini,
    GeminiProWithGpt4o,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset: {0}")]
pub struct UnknownPreset(pub String);

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Balanced,
        Preset::UltraFast,
        Preset::Premium,
        Preset::FreeTierMax,
        Preset::GeminiWithOpenAI,
        Preset::OpenAIWithGemini,
        Preset::GeminiProWithGpt4o,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Balanced => "balanced",
            Preset::UltraFast => "ultra_fast",
            Preset::Premium => "premium",
            Preset::FreeTierMax => "free_tier_max",
            Preset::GeminiWithOpenAI => "gemini_with_openai",
            Preset::OpenAIWithGemini => "openai_with_gemini",
            Preset::GeminiProWithGpt4o => "gemini_pro_with_gpt4o",
        }
    }

    /// A fresh copy of the preset's chain.
    pub fn configs(&self) -> Vec<BackendConfig> {
        match self {
            Preset::Balanced => balanced(),
            Preset::UltraFast => ultra_fast(),
            Preset::Premium => premium(),
            Preset::FreeTierMax => free_tier_max(),
            Preset::GeminiWithOpenAI => gemini_with_openai(),
            Preset::OpenAIWithGemini => openai_with_gemini(),
            Preset::GeminiProWithGpt4o => gemini_pro_with_gpt4o(),
        }
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    /// Accepts the snake_case name, case-insensitively, with `-` in place of `_` as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn gemini_flash_lite() -> BackendConfig {
    BackendConfig::new(
        Provider::Google,
        gemini::model_to_string(gemini::Model::Gemini25FlashLite),
    )
    .with_display_name("Gemini 2.5 Flash Lite")
}

fn groq_llama_70b() -> BackendConfig {
    BackendConfig::new(
        Provider::Groq,
        groq::model_to_string(groq::Model::Llama3370bVersatile),
    )
    .with_display_name("Groq Llama 3.3 70B")
}

fn groq_llama_8b() -> BackendConfig {
    BackendConfig::new(Provider::Groq, groq::model_to_string(groq::Model::Llama318bInstant))
        .with_display_name("Groq Llama 3.1 8B Instant")
}

fn groq_mixtral() -> BackendConfig {
    BackendConfig::new(Provider::Groq, groq::model_to_string(groq::Model::Mixtral8x7b32768))
        .with_display_name("Groq Mixtral 8x7B")
}

fn openai_gpt4o_mini() -> BackendConfig {
    BackendConfig::new(Provider::OpenAI, openai::model_to_string(openai::Model::GPT4oMini))
        .with_display_name("OpenAI GPT-4o-mini")
}

fn openai_gpt4o() -> BackendConfig {
    BackendConfig::new(Provider::OpenAI, openai::model_to_string(openai::Model::GPT4o))
        .with_display_name("OpenAI GPT-4o")
}

/// General purpose chain: fast free tiers first, a cheap paid model last.
pub fn balanced() -> Vec<BackendConfig> {
    vec![gemini_flash_lite(), groq_llama_70b(), openai_gpt4o_mini()]
}

pub fn ultra_fast() -> Vec<BackendConfig> {
    vec![gemini_flash_lite(), groq_llama_8b(), groq_mixtral()]
}

/// Quality first, falling back to free tiers when the paid quota runs out.
pub fn premium() -> Vec<BackendConfig> {
    vec![openai_gpt4o(), groq_llama_70b(), gemini_flash_lite()]
}

pub fn free_tier_max() -> Vec<BackendConfig> {
    vec![
        gemini_flash_lite(),
        groq_llama_70b(),
        groq_mixtral(),
        openai_gpt4o_mini(),
    ]
}

// Two-entry chains without display names; logs show `provider/model`.

pub fn gemini_with_openai() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new(Provider::Google, gemini::model_to_string(gemini::Model::Gemini25FlashLite)),
        BackendConfig::new(Provider::OpenAI, openai::model_to_string(openai::Model::GPT4oMini)),
    ]
}

pub fn openai_with_gemini() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new(Provider::OpenAI, openai::model_to_string(openai::Model::GPT4oMini)),
        BackendConfig::new(Provider::Google, gemini::model_to_string(gemini::Model::Gemini25FlashLite)),
    ]
}

pub fn gemini_pro_with_gpt4o() -> Vec<BackendConfig> {
    vec![
        BackendConfig::new(Provider::Google, gemini::model_to_string(gemini::Model::Gemini15ProLatest)),
        BackendConfig::new(Provider::OpenAI, openai::model_to_string(openai::Model::GPT4o)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(configs: &[BackendConfig]) -> Vec<String> {
        configs.iter().map(BackendConfig::display_name).collect()
    }

    #[test]
    fn test_balanced_order() {
        assert_eq!(
            names(&balanced()),
            vec!["Gemini 2.5 Flash Lite", "Groq Llama 3.3 70B", "OpenAI GPT-4o-mini"]
        );
        assert_eq!(balanced()[0].model_id, "gemini-2.5-flash-lite");
    }

    #[test]
    fn test_free_tier_max_puts_paid_last() {
        let chain = free_tier_max();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain[3].provider, Provider::OpenAI);
        assert_eq!(chain[2].model_id, "mixtral-8x7b-32768");
    }

    #[test]
    fn test_legacy_chains_derive_display_names() {
        assert_eq!(
            names(&gemini_pro_with_gpt4o()),
            vec!["google/gemini-1.5-pro-latest", "openai/gpt-4o"]
        );
        assert_eq!(
            names(&openai_with_gemini()),
            vec!["openai/gpt-4o-mini", "google/gemini-2.5-flash-lite"]
        );
    }

    #[test]
    fn test_parse_by_name() {
        for preset in Preset::ALL.iter() {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), *preset);
        }
        assert_eq!("Ultra-Fast".parse::<Preset>().unwrap(), Preset::UltraFast);
        assert_eq!(
            "fastest".parse::<Preset>().unwrap_err(),
            UnknownPreset("fastest".to_string())
        );
    }
}
