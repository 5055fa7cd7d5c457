//! Caller input for a single turn.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MIME type used when a file attachment does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A user turn: free text, an optional structured payload, and attachments.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    #[builder(into, default)]
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured: Option<Map<String, Value>>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileConfig>,
    /// Model override for this turn.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Prompt {
    /// Text-only prompt.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, file: FileConfig) -> Self {
        self.files.push(file);
        self
    }

    /// True when there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.structured.as_ref().map_or(true, Map::is_empty)
            && self.files.is_empty()
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

/// A file attached to a prompt.
///
/// When `contents` is set the bytes are sent inline and `path` is only used
/// for display. Otherwise `path` is either a URL (`http://`, `https://`,
/// `gs://`) sent as a remote reference, or a local path read at send time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileConfig {
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn from_bytes(name: impl Into<String>, contents: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            contents: Some(contents),
            name: Some(name),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn mime_type_or_default(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// Name shown in persisted history.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }
}
