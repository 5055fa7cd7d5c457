//! Persisted records: agents, chats, users.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{GenerationConfig, Tool};

/// Temperature given to agents created without any generation defaults.
pub const DEFAULT_AGENT_TEMPERATURE: f32 = 0.01;

/// Persona, instructions and defaults of an agent.
///
/// The agent's tools live in `default_generation_config.tools`.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[builder(into, default)]
    #[serde(default)]
    pub id: String,
    #[builder(into, default)]
    #[serde(default)]
    pub persona: String,
    #[builder(into, default)]
    #[serde(default)]
    pub system_instruction: String,
    #[builder(into, default)]
    #[serde(default)]
    pub default_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_generation_config: Option<GenerationConfig>,
}

impl AgentConfig {
    pub fn tools(&self) -> &[Tool] {
        self.default_generation_config
            .as_ref()
            .map(|c| c.tools.as_slice())
            .unwrap_or_default()
    }

    /// Mutable generation defaults, created with the default temperature if absent.
    pub fn generation_config_mut(&mut self) -> &mut GenerationConfig {
        self.default_generation_config
            .get_or_insert_with(|| GenerationConfig {
                temperature: Some(DEFAULT_AGENT_TEMPERATURE),
                ..Default::default()
            })
    }
}

/// Whether a chat shows up in user-facing listings.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatType {
    #[default]
    Conversational,
    /// Kept with full history but hidden from listings.
    Background,
}

/// Identity and settings of one chat.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    #[builder(into, default)]
    #[serde(default)]
    pub id: String,
    #[builder(into, default)]
    #[serde(default)]
    pub agent_id: String,
    #[builder(into, default)]
    #[serde(default)]
    pub user_id: String,
    /// Model override for every turn of this chat.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[builder(default)]
    #[serde(default)]
    pub chat_type: ChatType,
}

/// Free-form context known about an end user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub context: String,
}

impl User {
    pub fn new(id: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context: context.into(),
        }
    }
}
