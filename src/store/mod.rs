//! Persistence gateway over a key-value backend.
//!
//! Records are JSON documents under `{entity}:{id}` keys. Agents and chats are
//! indexed in the `agents:set` and `chats:set` sets, and each chat's history is
//! an append-only list at `chat:history:{id}`.

pub mod backend;
pub mod error;

pub use backend::{KeyValueBackend, MemoryBackend};
pub use error::{StoreError, StoreResult};

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::types::{AgentConfig, ChatConfig, ChatMessage, ChatType, User};

pub mod keys {
    pub const AGENTS_SET: &str = "agents:set";
    pub const CHATS_SET: &str = "chats:set";

    pub fn agent(id: &str) -> String {
        format!("agent:{id}")
    }

    pub fn chat(id: &str) -> String {
        format!("chat:{id}")
    }

    pub fn user(id: &str) -> String {
        format!("user:{id}")
    }

    pub fn chat_history(id: &str) -> String {
        format!("chat:history:{id}")
    }
}

/// Typed access to agents, chats, users and chat history.
///
/// A disabled store accepts every write as a no-op and answers every read
/// with nothing, which lets the client run without a backend.
#[derive(Clone)]
pub struct Store {
    backend: Option<Arc<dyn KeyValueBackend>>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("enabled", &self.backend.is_some())
            .finish()
    }
}

impl Store {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let json = serde_json::to_string(value)?;
        backend.set(key, json).await
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(backend) = &self.backend else {
            return Ok(None);
        };
        match backend.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Load every record whose id is in `set_key`. Missing or undecodable
    /// records are skipped.
    async fn list_indexed<T: DeserializeOwned>(
        &self,
        set_key: &str,
        key_for: fn(&str) -> String,
    ) -> StoreResult<Vec<T>> {
        let Some(backend) = &self.backend else {
            return Ok(Vec::new());
        };
        let mut records = Vec::new();
        for id in backend.set_members(set_key).await? {
            match self.get_json::<T>(&key_for(&id)).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(StoreError::Serialization(reason)) => {
                    warn!(set = set_key, id = %id, %reason, "Skipping undecodable record");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }

    async fn unindex(&self, keys: Vec<String>, set_key: &str, id: &str) -> StoreResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        backend.delete(&keys).await?;
        backend.set_remove(set_key, id).await
    }

    pub async fn save_agent(&self, agent: &AgentConfig) -> StoreResult<()> {
        self.put_json(&keys::agent(&agent.id), agent).await?;
        if let Some(backend) = &self.backend {
            backend.set_add(keys::AGENTS_SET, &agent.id).await?;
        }
        Ok(())
    }

    pub async fn get_agent(&self, agent_id: &str) -> StoreResult<Option<AgentConfig>> {
        self.get_json(&keys::agent(agent_id)).await
    }

    pub async fn list_agents(&self) -> StoreResult<Vec<AgentConfig>> {
        self.list_indexed(keys::AGENTS_SET, keys::agent).await
    }

    pub async fn remove_agent(&self, agent_id: &str) -> StoreResult<()> {
        self.unindex(vec![keys::agent(agent_id)], keys::AGENTS_SET, agent_id)
            .await
    }

    pub async fn save_chat(&self, chat: &ChatConfig) -> StoreResult<()> {
        self.put_json(&keys::chat(&chat.id), chat).await?;
        if let Some(backend) = &self.backend {
            backend.set_add(keys::CHATS_SET, &chat.id).await?;
        }
        Ok(())
    }

    pub async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<ChatConfig>> {
        self.get_json(&keys::chat(chat_id)).await
    }

    /// Every chat, background ones included.
    pub async fn list_chats(&self) -> StoreResult<Vec<ChatConfig>> {
        self.list_indexed(keys::CHATS_SET, keys::chat).await
    }

    /// Conversational chats of one user with one agent.
    pub async fn list_chats_by_user(
        &self,
        user_id: &str,
        agent_id: &str,
    ) -> StoreResult<Vec<ChatConfig>> {
        let chats = self.list_chats().await?;
        Ok(chats
            .into_iter()
            .filter(|c| {
                c.user_id == user_id
                    && c.agent_id == agent_id
                    && c.chat_type == ChatType::Conversational
            })
            .collect())
    }

    /// Delete a chat's config and history and drop it from the index.
    pub async fn remove_chat(&self, chat_id: &str) -> StoreResult<()> {
        self.unindex(
            vec![keys::chat(chat_id), keys::chat_history(chat_id)],
            keys::CHATS_SET,
            chat_id,
        )
        .await
    }

    pub async fn save_user_context(&self, user_id: &str, context: &str) -> StoreResult<User> {
        let user = User::new(user_id, context);
        self.put_json(&keys::user(user_id), &user).await?;
        Ok(user)
    }

    pub async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.get_json(&keys::user(user_id)).await
    }

    pub async fn remove_user(&self, user_id: &str) -> StoreResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        backend.delete(&[keys::user(user_id)]).await
    }

    pub async fn append_message(&self, chat_id: &str, message: &ChatMessage) -> StoreResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let json = serde_json::to_string(message)?;
        backend.list_push(&keys::chat_history(chat_id), json).await
    }

    /// History in append order. Empty for unknown chats; undecodable entries
    /// are skipped.
    pub async fn chat_history(&self, chat_id: &str) -> StoreResult<Vec<ChatMessage>> {
        let Some(backend) = &self.backend else {
            return Ok(Vec::new());
        };
        let raw = backend.list_range(&keys::chat_history(chat_id), 0, -1).await?;
        let mut history = Vec::with_capacity(raw.len());
        for (index, entry) in raw.iter().enumerate() {
            match serde_json::from_str::<ChatMessage>(entry) {
                Ok(message) => history.push(message),
                Err(err) => warn!(chat_id, index, error = %err, "Skipping undecodable history entry"),
            }
        }
        Ok(history)
    }
}
