//! Generation config to wire request config.

use std::str::FromStr;

use crate::error::{GenaiError, Result};
use crate::types::{GenerationConfig, ToolConfig};
use crate::wire::{
    Content, FunctionCallingConfig, FunctionCallingMode, GenerateContentConfig, Part, WireToolConfig,
};

use super::schema::resolve_schema;
use super::tool::tools_to_wire;

/// MIME type requested whenever a response schema is set.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Parse a function-calling mode. Empty means `AUTO`.
pub fn function_calling_mode(mode: &str) -> Result<FunctionCallingMode> {
    let mode = mode.trim();
    if mode.is_empty() {
        return Ok(FunctionCallingMode::Auto);
    }
    FunctionCallingMode::from_str(mode).map_err(|_| GenaiError::InvalidMode(mode.to_string()))
}

pub fn tool_config_to_wire(config: &ToolConfig) -> Result<WireToolConfig> {
    let mode = function_calling_mode(&config.mode)?;
    Ok(WireToolConfig {
        function_calling_config: Some(FunctionCallingConfig {
            mode: Some(mode),
            allowed_function_names: config.allowed_tools.clone(),
        }),
    })
}

/// Build the request config for one call.
pub fn to_wire_config(
    config: &GenerationConfig,
    system_instruction: Option<Content>,
) -> Result<GenerateContentConfig> {
    let mut wire = GenerateContentConfig {
        system_instruction,
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k,
        max_output_tokens: (config.max_output_tokens != 0).then_some(config.max_output_tokens),
        stop_sequences: config.stop_sequences.clone(),
        ..Default::default()
    };

    if let Some(schema_config) = &config.response_schema {
        if let Some(schema) = resolve_schema(schema_config, "response schema")? {
            wire.response_mime_type = Some(JSON_MIME_TYPE.to_string());
            wire.response_schema = Some(schema);
        }
    }

    wire.tools = tools_to_wire(&config.tools)?;

    if let Some(tool_config) = &config.tool_config {
        let converted = tool_config_to_wire(tool_config)
            .map_err(|e| GenaiError::config_conversion("tool config", e))?;
        wire.tool_config = Some(converted);
    }

    Ok(wire)
}

/// System instruction from an agent's persona and instruction text, plus an
/// optional `User Context: ...` part. `None` when every piece is empty.
pub fn system_instruction(
    persona: &str,
    instruction: &str,
    user_context: Option<&str>,
) -> Option<Content> {
    let mut parts = Vec::new();
    if !persona.trim().is_empty() {
        parts.push(Part::text(persona));
    }
    if !instruction.trim().is_empty() {
        parts.push(Part::text(instruction));
    }
    if let Some(context) = user_context.filter(|c| !c.trim().is_empty()) {
        parts.push(Part::text(format!("User Context: {context}")));
    }
    (!parts.is_empty()).then(|| Content::unattributed(parts))
}
