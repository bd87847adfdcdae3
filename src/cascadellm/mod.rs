// src/cascadellm/mod.rs

pub mod cascade;
pub mod classifier;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod error;
pub mod fallback;
pub mod presets;
pub mod registry;

// Let's explicitly export FallbackClient so we don't have to access it via
// cascadellm::fallback::FallbackClient
pub use fallback::FallbackClient;
