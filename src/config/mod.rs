use garde::Validate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    #[garde(length(min = 1))]
    pub bind_addr: String,

    /// Gemini API credential (read from `API_KEY`). Read once at startup and
    /// reused for every call; rotating the key needs a restart.
    #[garde(length(min = 1))]
    pub api_key: String,

    /// Image generation model identifier
    #[serde(default = "default_gemini_model")]
    #[garde(length(min = 1))]
    pub gemini_model: String,

    /// Base URL of the Generative Language API
    #[serde(default = "default_gemini_api_base")]
    #[garde(length(min = 1))]
    pub gemini_api_base: String,

    /// Upper bound on a single generation call before the job is failed
    #[serde(default = "default_generation_timeout_secs")]
    #[garde(range(min = 1, max = 3600))]
    pub generation_timeout_secs: u64,

    /// Maximum accepted upload request size in bytes
    #[serde(default = "default_max_upload_bytes")]
    #[garde(range(min = 1))]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    120
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
