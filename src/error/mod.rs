//! Error types for genaiclient.

pub mod kind;

pub use kind::ErrorKind;

use thiserror::Error;

use crate::store::StoreError;

/// Primary error type for all client, agent and chat operations.
#[derive(Error, Debug)]
pub enum GenaiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid function calling mode: {0:?}")]
    InvalidMode(String),

    #[error("Config conversion failed ({context}): {source}")]
    ConfigConversion {
        context: String,
        #[source]
        source: Box<GenaiError>,
    },

    #[error("Content conversion failed ({context}): {source}")]
    ContentConversion {
        context: String,
        #[source]
        source: Box<GenaiError>,
    },

    #[error("Prompt conversion failed ({context}): {source}")]
    PromptConversion {
        context: String,
        #[source]
        source: Box<GenaiError>,
    },

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Generate failed ({context}): {source}")]
    Generate {
        context: String,
        #[source]
        source: Box<GenaiError>,
    },

    #[error("Stream failed ({context}): {source}")]
    Stream {
        context: String,
        #[source]
        source: Box<GenaiError>,
    },

    #[error("Embedding failed ({context}): {source}")]
    Embed {
        context: String,
        #[source]
        source: Box<GenaiError>,
    },

    #[error("Persistence failed ({context}): {source}")]
    Persistence {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("Tool {0:?} not found")]
    ToolNotFound(String),

    #[error("Chat {0:?} not found")]
    ChatNotFound(String),

    #[error("Agent {0:?} not found")]
    AgentNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation canceled")]
    Canceled,
}

impl GenaiError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn config_conversion(context: impl Into<String>, source: GenaiError) -> Self {
        Self::ConfigConversion {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn content_conversion(context: impl Into<String>, source: GenaiError) -> Self {
        Self::ContentConversion {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn prompt_conversion(context: impl Into<String>, source: GenaiError) -> Self {
        Self::PromptConversion {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn generate(context: impl Into<String>, source: GenaiError) -> Self {
        Self::Generate {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn stream(context: impl Into<String>, source: GenaiError) -> Self {
        Self::Stream {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn embed(context: impl Into<String>, source: GenaiError) -> Self {
        Self::Embed {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn persistence(context: impl Into<String>, source: StoreError) -> Self {
        Self::Persistence {
            context: context.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidMode(_) => ErrorKind::InvalidMode,
            Self::ConfigConversion { .. } => ErrorKind::ConfigConversion,
            Self::ContentConversion { .. } => ErrorKind::ContentConversion,
            Self::PromptConversion { .. } => ErrorKind::PromptConversion,
            Self::EmptyResponse(_) => ErrorKind::EmptyResponse,
            Self::Generate { .. } => ErrorKind::Generate,
            Self::Stream { .. } => ErrorKind::Stream,
            Self::Embed { .. } => ErrorKind::Embed,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::ToolNotFound(_) => ErrorKind::ToolNotFound,
            Self::ChatNotFound(_) => ErrorKind::ChatNotFound,
            Self::AgentNotFound(_) => ErrorKind::AgentNotFound,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Api { .. } => ErrorKind::Api,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Network(_) => ErrorKind::Network,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Canceled => ErrorKind::Canceled,
        }
    }

    /// The innermost error, following wrapped inference and conversion causes.
    pub fn root(&self) -> &GenaiError {
        match self {
            Self::ConfigConversion { source, .. }
            | Self::ContentConversion { source, .. }
            | Self::PromptConversion { source, .. }
            | Self::Generate { source, .. }
            | Self::Stream { source, .. }
            | Self::Embed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the underlying failure is transient.
    ///
    /// Informational only; nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Api { status, .. } => matches!(status, 500..=599),
            _ => false,
        }
    }
}

impl From<StoreError> for GenaiError {
    fn from(error: StoreError) -> Self {
        Self::persistence("store operation", error)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GenaiError>;
