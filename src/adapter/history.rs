//! Persisted history replay.

use crate::types::{ChatMessage, MessageRole};
use crate::wire::{Content, Part};

/// Model messages replay as model turns; user and tool messages as user turns.
pub fn message_to_content(message: &ChatMessage) -> Content {
    let part = Part::text(message.content.clone());
    match message.role {
        MessageRole::Model => Content::model(vec![part]),
        MessageRole::User | MessageRole::Tool => Content::user(vec![part]),
    }
}

pub fn history_to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    messages.iter().map(message_to_content).collect()
}
