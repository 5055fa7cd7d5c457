//! Generation configuration, tool declarations, and their merge rules.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adapter::schema::SchemaType;
use crate::wire::Schema;

/// Sampling and output controls for a generate call.
///
/// Every field has an "unset" state (`None`, zero, or empty) so a partial
/// config can be layered over a complete one with [`GenerationConfig::merged`].
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<f32>,
    /// Zero means unset.
    #[builder(default)]
    #[serde(default)]
    pub max_output_tokens: i32,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<SchemaConfig>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

impl GenerationConfig {
    /// Apply the set fields of `other` on top of `self`.
    ///
    /// Scalars are replaced when present (non-zero for `max_output_tokens`),
    /// lists when non-empty, and schema/tool config as whole values.
    pub fn merge_from(&mut self, other: &GenerationConfig) {
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.top_p.is_some() {
            self.top_p = other.top_p;
        }
        if other.top_k.is_some() {
            self.top_k = other.top_k;
        }
        if other.max_output_tokens != 0 {
            self.max_output_tokens = other.max_output_tokens;
        }
        if !other.stop_sequences.is_empty() {
            self.stop_sequences = other.stop_sequences.clone();
        }
        if other.response_schema.is_some() {
            self.response_schema = other.response_schema.clone();
        }
        if !other.tools.is_empty() {
            self.tools = other.tools.clone();
        }
        if other.tool_config.is_some() {
            self.tool_config = other.tool_config.clone();
        }
    }

    /// A copy of `self` with `override_config` applied. `self` is untouched.
    pub fn merged(&self, override_config: Option<&GenerationConfig>) -> GenerationConfig {
        let mut merged = self.clone();
        if let Some(other) = override_config {
            merged.merge_from(other);
        }
        merged
    }
}

/// Layer an optional override over an optional base.
pub fn merge_generation_config(
    base: Option<&GenerationConfig>,
    override_config: Option<&GenerationConfig>,
) -> GenerationConfig {
    base.cloned().unwrap_or_default().merged(override_config)
}

/// A function the model may call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<SchemaConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<SchemaConfig>,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            request: None,
            response: None,
        }
    }

    pub fn with_request(mut self, schema: SchemaConfig) -> Self {
        self.request = Some(schema);
        self
    }

    pub fn with_response(mut self, schema: SchemaConfig) -> Self {
        self.response = Some(schema);
        self
    }
}

/// Function-calling policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolConfig {
    /// `AUTO`, `ANY`, `NONE`, `VALIDATED`, `MODE_UNSPECIFIED`, or empty for auto.
    #[serde(default)]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
}

impl ToolConfig {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            allowed_tools: Vec::new(),
        }
    }

    pub fn with_allowed_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = names.into_iter().map(Into::into).collect();
        self
    }
}

/// A schema from one of three sources.
///
/// When more than one is set, resolution prefers `json`, then `derived`,
/// then `wire` (see [`crate::adapter::schema::resolve_schema`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchemaConfig {
    /// Raw JSON-schema object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Map<String, Value>>,
    /// Schema computed from a Rust type when the config was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<Schema>,
    /// Pre-built wire schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire: Option<Schema>,
}

impl SchemaConfig {
    pub fn from_json(json: Map<String, Value>) -> Self {
        Self {
            json: Some(json),
            ..Default::default()
        }
    }

    pub fn from_type<T: SchemaType>() -> Self {
        Self {
            derived: Some(T::schema()),
            ..Default::default()
        }
    }

    pub fn from_wire(schema: Schema) -> Self {
        Self {
            wire: Some(schema),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.json.is_none() && self.derived.is_none() && self.wire.is_none()
    }
}
