//! Agents and their chat sessions.

pub mod agent;
pub mod chat;
pub mod locks;
pub mod stream;

pub use agent::Agent;
pub use chat::ChatSession;
pub use locks::ChatLocks;
pub use stream::{ChatStream, ChatStreamEvent};

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::ClientOptions;
use crate::error::{GenaiError, Result};
use crate::provider::InferenceClient;
use crate::store::Store;
use crate::types::ModelResponse;

/// Dependencies shared by every agent and chat of one client.
pub(crate) struct AgentContext {
    pub(crate) inference: Arc<dyn InferenceClient>,
    pub(crate) store: Store,
    pub(crate) locks: ChatLocks,
    pub(crate) options: ClientOptions,
}

/// Parse a JSON reply produced under a response schema.
pub(crate) fn parse_structured<T: DeserializeOwned>(response: &ModelResponse) -> Result<T> {
    let text = response.text.trim();
    if text.is_empty() {
        return Err(GenaiError::EmptyResponse(
            "structured reply has no text".to_string(),
        ));
    }
    Ok(serde_json::from_str(text)?)
}
