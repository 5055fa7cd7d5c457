//! Coarse error classification.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad error kind for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InvalidMode,
    ConfigConversion,
    ContentConversion,
    PromptConversion,
    EmptyResponse,
    Generate,
    Stream,
    Embed,
    Persistence,
    ToolNotFound,
    ChatNotFound,
    AgentNotFound,
    Configuration,
    Api,
    Authentication,
    RateLimit,
    Network,
    Io,
    Serialization,
    Canceled,
}
