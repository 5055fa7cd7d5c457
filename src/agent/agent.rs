//! Agent: persona, defaults and tools shared by its chats.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::adapter::{
    prompt_to_content, response_to_model_response, system_instruction, to_wire_config, SchemaType,
};
use crate::error::{GenaiError, Result};
use crate::types::{
    AgentConfig, ChatConfig, GenerationConfig, ModelResponse, Prompt, SchemaConfig, Tool,
    DEFAULT_AGENT_TEMPERATURE,
};
use crate::wire::Content;

use super::chat::ChatSession;
use super::{parse_structured, AgentContext};

/// A configured assistant. Cheap to clone; chats are not cached in memory.
#[derive(Clone)]
pub struct Agent {
    config: AgentConfig,
    ctx: Arc<AgentContext>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").field("config", &self.config).finish()
    }
}

impl Agent {
    /// Materialize an agent. Missing generation defaults get the default
    /// temperature and a missing model the client default.
    pub(crate) fn new(mut config: AgentConfig, ctx: Arc<AgentContext>) -> Self {
        if config.default_generation_config.is_none() {
            config.default_generation_config = Some(GenerationConfig {
                temperature: Some(DEFAULT_AGENT_TEMPERATURE),
                ..Default::default()
            });
        }
        if config.default_model.is_empty() {
            config.default_model = ctx.options.default_model.clone();
        }
        Self { config, ctx }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &[Tool] {
        self.config.tools()
    }

    /// Add a tool and persist the agent. A tool with the same name is replaced.
    pub async fn add_tool(&mut self, tool: Tool) -> Result<()> {
        let tools = &mut self.config.generation_config_mut().tools;
        match tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => tools.push(tool),
        }
        self.persist().await
    }

    /// Remove a tool by name and persist the agent.
    pub async fn remove_tool(&mut self, name: &str) -> Result<()> {
        let tools = &mut self.config.generation_config_mut().tools;
        let index = tools
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| GenaiError::ToolNotFound(name.to_string()))?;
        tools.remove(index);
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        self.ctx
            .store
            .save_agent(&self.config)
            .await
            .map_err(|e| GenaiError::persistence(format!("save agent {}", self.id()), e))
    }

    /// One-shot generation without chat history.
    ///
    /// The user's stored context, when there is any, is added to the system
    /// instruction. A failed lookup is ignored.
    pub async fn generate(
        &self,
        user_id: &str,
        prompt: &Prompt,
        override_config: Option<&GenerationConfig>,
    ) -> Result<ModelResponse> {
        let merged = self.default_generation_config().merged(override_config);
        let instruction = self.system_instruction_for(user_id).await;
        let config = to_wire_config(&merged, instruction).map_err(|e| match e {
            GenaiError::ConfigConversion { .. } => e,
            other => GenaiError::config_conversion(format!("agent {}", self.id()), other),
        })?;

        let content = prompt_to_content(prompt)
            .await
            .map_err(|e| GenaiError::prompt_conversion(format!("agent {}", self.id()), e))?;

        let model = prompt
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.config.default_model);

        debug!(agent_id = %self.id(), model, "Agent generate request");
        let response = self
            .ctx
            .inference
            .generate_content(model, &[content], &config)
            .await
            .map_err(|e| GenaiError::generate(format!("agent {} model {}", self.id(), model), e))?;

        response_to_model_response(&response)
    }

    /// [`generate`](Self::generate) with the reply constrained to and parsed as `T`.
    pub async fn generate_structured<T>(
        &self,
        user_id: &str,
        prompt: &Prompt,
        override_config: Option<&GenerationConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned + SchemaType,
    {
        let mut config = override_config.cloned().unwrap_or_default();
        config.response_schema = Some(SchemaConfig::from_type::<T>());
        let response = self.generate(user_id, prompt, Some(&config)).await?;
        parse_structured(&response)
    }

    /// Create and persist a chat owned by this agent.
    pub async fn new_chat(&self, mut config: ChatConfig) -> Result<ChatSession> {
        config.agent_id = self.config.id.clone();
        if config.id.is_empty() {
            config.id = Uuid::new_v4().to_string();
        }
        self.ctx
            .store
            .save_chat(&config)
            .await
            .map_err(|e| GenaiError::persistence(format!("create chat {}", config.id), e))?;
        Ok(self.open_chat(config).await)
    }

    /// Reopen a persisted chat of this agent.
    pub async fn get_chat(&self, chat_id: &str) -> Result<ChatSession> {
        let config = self.get_chat_config(chat_id).await?;
        Ok(self.open_chat(config).await)
    }

    /// Conversational chats between this agent and a user.
    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatConfig>> {
        self.ctx
            .store
            .list_chats_by_user(user_id, self.id())
            .await
            .map_err(|e| GenaiError::persistence(format!("list chats of user {user_id}"), e))
    }

    /// Delete a chat of this agent with its history.
    pub async fn remove_chat(&self, chat_id: &str) -> Result<()> {
        self.get_chat_config(chat_id).await?;
        self.ctx
            .store
            .remove_chat(chat_id)
            .await
            .map_err(|e| GenaiError::persistence(format!("remove chat {chat_id}"), e))
    }

    /// Chats of other agents are reported as missing.
    async fn get_chat_config(&self, chat_id: &str) -> Result<ChatConfig> {
        self.ctx
            .store
            .get_chat(chat_id)
            .await
            .map_err(|e| GenaiError::persistence(format!("load chat {chat_id}"), e))?
            .filter(|c| c.agent_id == self.config.id)
            .ok_or_else(|| GenaiError::ChatNotFound(chat_id.to_string()))
    }

    async fn open_chat(&self, config: ChatConfig) -> ChatSession {
        let generation_config = self
            .default_generation_config()
            .merged(config.generation_config.as_ref());
        let model = config
            .model
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.config.default_model.clone());
        let instruction = self.system_instruction_for(&config.user_id).await;
        ChatSession::open(config, model, generation_config, instruction, &self.ctx).await
    }

    fn default_generation_config(&self) -> GenerationConfig {
        self.config.default_generation_config.clone().unwrap_or_default()
    }

    async fn system_instruction_for(&self, user_id: &str) -> Option<Content> {
        let user_context = if user_id.is_empty() {
            None
        } else {
            match self.ctx.store.find_user(user_id).await {
                Ok(user) => user.map(|u| u.context),
                Err(err) => {
                    debug!(user_id, error = %err, "User context lookup failed");
                    None
                }
            }
        };
        system_instruction(
            &self.config.persona,
            &self.config.system_instruction,
            user_context.as_deref(),
        )
    }
}
