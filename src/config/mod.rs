//! Client configuration (code > env > defaults).

use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings and model defaults.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub default_embedding_model: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_embedding_model", &self.default_embedding_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Model defaults handed to agents and chats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub default_model: String,
    pub default_embedding_model: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load from environment variables, reading `.env` first if present.
    ///
    /// `GEMINI_API_KEY` (or `GOOGLE_API_KEY`), `GEMINI_BASE_URL`,
    /// `GENAI_DEFAULT_MODEL`, `GENAI_EMBEDDING_MODEL`, `GENAI_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.api_key = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY"));
        if let Some(url) = var("GEMINI_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = var("GENAI_DEFAULT_MODEL") {
            config.default_model = model;
        }
        if let Some(model) = var("GENAI_EMBEDDING_MODEL") {
            config.default_embedding_model = model;
        }
        if let Some(secs) = var("GENAI_TIMEOUT_SECS").and_then(|s| s.trim().parse::<u64>().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn options(&self) -> ClientOptions {
        ClientOptions {
            default_model: self.default_model.clone(),
            default_embedding_model: self.default_embedding_model.clone(),
        }
    }
}
