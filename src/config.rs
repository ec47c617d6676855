//! Remote AI endpoint configuration.
//!
//! Values default to the Together AI chat-completions endpoint with a
//! Mistral instruct model; the API key always comes from the environment
//! (`LEAFSCAN_API_KEY`, loadable from a `.env` file via dotenvy).

use crate::errors::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "https://api.together.xyz/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const API_KEY_ENV: &str = "LEAFSCAN_API_KEY";
pub const API_URL_ENV: &str = "LEAFSCAN_API_URL";
pub const MODEL_ENV: &str = "LEAFSCAN_AI_MODEL";

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_key: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            api_key: String::new(),
        }
    }
}

impl AiConfig {
    /// Build a config from the environment, falling back to defaults for
    /// everything except the API key.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url;
            }
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.api_key = key.trim().to_string();
        }
        config
    }

    /// Whether a usable API key is present. The disease-info feature is
    /// disabled when this is false.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn require_configured(&self) -> AppResult<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "No API key configured. Set {} to enable disease info lookups.",
                API_KEY_ENV
            )))
        }
    }
}
