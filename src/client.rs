//! Caller-facing entry point.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::adapter::prompt_to_content;
use crate::agent::{Agent, AgentContext, ChatLocks};
use crate::config::ClientOptions;
use crate::error::{GenaiError, Result};
use crate::provider::InferenceClient;
use crate::store::Store;
use crate::types::{AgentConfig, Prompt, User};
use crate::wire::EmbedContentConfig;

/// Longest input echoed back in a bulk-embedding error.
const MAX_ERROR_TEXT_LEN: usize = 250;

/// Task type requested when an embedding dimension is set.
const RETRIEVAL_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";

/// Per-call embedding options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Overrides the client's embedding model.
    pub model: Option<String>,
    /// Output dimensionality; zero or `None` keeps the model default.
    pub dimensions: Option<u32>,
}

/// Factory for agents plus stateless services (embeddings, user context).
///
/// All agents and chats created from one client share its inference client,
/// store and per-chat turn locks.
#[derive(Clone)]
pub struct GenaiClient {
    ctx: Arc<AgentContext>,
}

impl std::fmt::Debug for GenaiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiClient")
            .field("store", &self.ctx.store)
            .field("options", &self.ctx.options)
            .finish()
    }
}

impl GenaiClient {
    pub fn new(inference: Arc<dyn InferenceClient>, store: Store, options: ClientOptions) -> Self {
        Self {
            ctx: Arc::new(AgentContext {
                inference,
                store,
                locks: ChatLocks::new(),
                options,
            }),
        }
    }

    /// Client over the Gemini REST API.
    #[cfg(feature = "gemini")]
    pub fn from_config(config: &crate::config::ClientConfig, store: Store) -> Result<Self> {
        let gemini = crate::provider::GeminiClient::from_config(config)?;
        Ok(Self::new(Arc::new(gemini), store, config.options()))
    }

    pub fn store(&self) -> &Store {
        &self.ctx.store
    }

    pub fn options(&self) -> &ClientOptions {
        &self.ctx.options
    }

    /// Persist a new agent. Empty ids get a UUID and an empty model the
    /// client default.
    pub async fn new_agent(&self, mut config: AgentConfig) -> Result<Agent> {
        if config.id.is_empty() {
            config.id = Uuid::new_v4().to_string();
        }
        let agent = Agent::new(config, self.ctx.clone());
        self.ctx
            .store
            .save_agent(agent.config())
            .await
            .map_err(|e| GenaiError::persistence(format!("create agent {}", agent.id()), e))?;
        debug!(agent_id = %agent.id(), "Created agent");
        Ok(agent)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let config = self
            .ctx
            .store
            .get_agent(agent_id)
            .await
            .map_err(|e| GenaiError::persistence(format!("load agent {agent_id}"), e))?
            .ok_or_else(|| GenaiError::AgentNotFound(agent_id.to_string()))?;
        Ok(Agent::new(config, self.ctx.clone()))
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentConfig>> {
        self.ctx
            .store
            .list_agents()
            .await
            .map_err(|e| GenaiError::persistence("list agents", e))
    }

    pub async fn remove_agent(&self, agent_id: &str) -> Result<()> {
        self.ctx
            .store
            .remove_agent(agent_id)
            .await
            .map_err(|e| GenaiError::persistence(format!("remove agent {agent_id}"), e))
    }

    /// Store free-form context about a user, used in that user's system
    /// instructions.
    pub async fn set_user_context(&self, user_id: &str, context: &str) -> Result<User> {
        self.ctx
            .store
            .save_user_context(user_id, context)
            .await
            .map_err(|e| GenaiError::persistence(format!("save user {user_id}"), e))
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.ctx
            .store
            .find_user(user_id)
            .await
            .map_err(|e| GenaiError::persistence(format!("load user {user_id}"), e))
    }

    pub async fn remove_user(&self, user_id: &str) -> Result<()> {
        self.ctx
            .store
            .remove_user(user_id)
            .await
            .map_err(|e| GenaiError::persistence(format!("remove user {user_id}"), e))
    }

    /// Embed one text.
    pub async fn embed(&self, text: &str, options: Option<&EmbedOptions>) -> Result<Vec<f32>> {
        let content = prompt_to_content(&Prompt::from_text(text))
            .await
            .map_err(|e| GenaiError::content_conversion("embed input", e))?;

        let model = options
            .and_then(|o| o.model.as_deref())
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.ctx.options.default_embedding_model);
        let config = options
            .and_then(|o| o.dimensions)
            .filter(|d| *d > 0)
            .map(|dimensions| EmbedContentConfig {
                task_type: Some(RETRIEVAL_DOCUMENT.to_string()),
                output_dimensionality: Some(dimensions),
                ..Default::default()
            });

        debug!(model, "Embed request");
        let response = self
            .ctx
            .inference
            .embed_content(model, &[content], config.as_ref())
            .await
            .map_err(|e| GenaiError::embed(format!("model {model}"), e))?;

        response
            .embeddings
            .into_iter()
            .next()
            .map(|e| e.values)
            .ok_or_else(|| GenaiError::EmptyResponse(format!("no embedding returned by {model}")))
    }

    /// Embed texts one by one, stopping at the first failure.
    pub async fn embed_bulk<S: AsRef<str>>(
        &self,
        texts: &[S],
        options: Option<&EmbedOptions>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let text = text.as_ref();
            let vector = self.embed(text, options).await.map_err(|e| {
                GenaiError::embed(
                    format!("bulk item {index} (value: {:?})", truncate(text, MAX_ERROR_TEXT_LEN)),
                    e,
                )
            })?;
            vectors.push(vector);
        }
        Ok(vectors)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
