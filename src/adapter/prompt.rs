//! Prompt to wire content.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{GenaiError, Result};
use crate::types::{FileConfig, Prompt};
use crate::wire::{Content, Part};

const REMOTE_SCHEMES: [&str; 3] = ["http://", "https://", "gs://"];

/// Convert a prompt into one user content.
///
/// Parts are ordered: text, structured payload as JSON text, then files in
/// list order. Local files are read from disk; any read failure fails the
/// whole conversion.
pub async fn prompt_to_content(prompt: &Prompt) -> Result<Content> {
    if prompt.is_empty() {
        return Err(GenaiError::Validation(
            "prompt has no text, structured payload or files".to_string(),
        ));
    }

    let mut parts = Vec::with_capacity(prompt.files.len() + 2);
    if !prompt.text.is_empty() {
        parts.push(Part::text(prompt.text.clone()));
    }
    if let Some(structured) = prompt.structured.as_ref().filter(|m| !m.is_empty()) {
        let json = serde_json::to_string(structured)
            .map_err(|e| GenaiError::content_conversion("structured payload", e.into()))?;
        parts.push(Part::text(json));
    }
    for file in &prompt.files {
        parts.push(file_part(file).await?);
    }

    Ok(Content::user(parts))
}

async fn file_part(file: &FileConfig) -> Result<Part> {
    let mime_type = file.mime_type_or_default();
    if let Some(bytes) = &file.contents {
        return Ok(Part::inline_data(mime_type, STANDARD.encode(bytes)));
    }
    if is_remote(&file.path) {
        return Ok(Part::file_data(&file.path, mime_type));
    }
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| GenaiError::content_conversion(format!("read file {:?}", file.path), e.into()))?;
    Ok(Part::inline_data(mime_type, STANDARD.encode(bytes)))
}

fn is_remote(path: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| path.starts_with(scheme))
}

/// Text recorded in chat history for a user prompt.
///
/// Attachments are logged as `[file: name]` placeholders, never their bytes.
pub fn prompt_log_text(prompt: &Prompt) -> String {
    let mut lines = Vec::new();
    if !prompt.text.is_empty() {
        lines.push(prompt.text.clone());
    }
    if let Some(structured) = prompt.structured.as_ref().filter(|m| !m.is_empty()) {
        lines.push(serde_json::Value::Object(structured.clone()).to_string());
    }
    for file in &prompt.files {
        lines.push(format!("[file: {}]", file.display_name()));
    }
    lines.join("\n")
}
