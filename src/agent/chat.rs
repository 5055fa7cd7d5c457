//! Chat sessions: persisted, ordered, tool-aware conversations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::adapter::{
    history_to_contents, prompt_log_text, prompt_to_content, response_to_model_response,
    to_wire_config, SchemaType,
};
use crate::error::{GenaiError, Result};
use crate::provider::InferenceClient;
use crate::store::Store;
use crate::types::{
    ChatConfig, ChatMessage, ChatType, FunctionCall, GenerationConfig, ModelResponse, Prompt,
    SchemaConfig,
};
use crate::wire::{Content, GenerateContentConfig, Part};

use super::parse_structured;
use super::stream::{ChatStream, StreamProducer, STREAM_BUFFER};
use super::AgentContext;

/// A stateful conversation between one user and one agent.
///
/// The durable state is the chat's history log in the store. The session
/// also keeps the turn context sent upstream, rebuilt from that log when the
/// session is opened. Turns on the same chat id are serialized, including
/// across sessions opened separately.
#[derive(Clone)]
pub struct ChatSession {
    config: ChatConfig,
    model: String,
    generation_config: GenerationConfig,
    system_instruction: Option<Content>,
    turns: Arc<Mutex<Vec<Content>>>,
    turn_lock: Arc<Mutex<()>>,
    inference: Arc<dyn InferenceClient>,
    store: Store,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.config.id)
            .field("user_id", &self.config.user_id)
            .field("agent_id", &self.config.agent_id)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatSession {
    /// Open a session over a persisted chat, replaying its history.
    ///
    /// A history load failure is logged and the session starts empty.
    pub(crate) async fn open(
        config: ChatConfig,
        model: String,
        generation_config: GenerationConfig,
        system_instruction: Option<Content>,
        ctx: &AgentContext,
    ) -> Self {
        let history = match ctx.store.chat_history(&config.id).await {
            Ok(history) => history,
            Err(err) => {
                warn!(chat_id = %config.id, error = %err, "Failed to load chat history");
                Vec::new()
            }
        };
        debug!(chat_id = %config.id, turns = history.len(), "Opened chat session");

        Self {
            turn_lock: ctx.locks.lock_for(&config.id),
            turns: Arc::new(Mutex::new(history_to_contents(&history))),
            inference: ctx.inference.clone(),
            store: ctx.store.clone(),
            config,
            model,
            generation_config,
            system_instruction,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    pub fn chat_type(&self) -> ChatType {
        self.config.chat_type
    }

    /// Model used when a prompt does not name one.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generation config resolved when the session was opened.
    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }

    /// Persisted history in order.
    pub async fn history(&self) -> Result<Vec<ChatMessage>> {
        self.store
            .chat_history(self.id())
            .await
            .map_err(|e| GenaiError::persistence(format!("load history of chat {}", self.id()), e))
    }

    /// Send a prompt and wait for the full reply.
    ///
    /// The user turn is persisted before the model is called; if that fails
    /// the model is never called. Saving the reply is best-effort.
    pub async fn send_message(
        &self,
        prompt: &Prompt,
        override_config: Option<&GenerationConfig>,
    ) -> Result<ModelResponse> {
        let _turn = self.turn_lock.lock().await;

        let content = self.convert_prompt(prompt).await?;
        let config = self.request_config(override_config)?;
        self.persist_user_turn(prompt).await?;

        self.exchange(content, self.model_for(prompt), &config).await
    }

    /// Like [`send_message`](Self::send_message) with the reply parsed as `T`.
    pub async fn send_structured<T>(
        &self,
        prompt: &Prompt,
        override_config: Option<&GenerationConfig>,
    ) -> Result<T>
    where
        T: DeserializeOwned + SchemaType,
    {
        let mut config = override_config.cloned().unwrap_or_default();
        config.response_schema = Some(SchemaConfig::from_type::<T>());
        let response = self.send_message(prompt, Some(&config)).await?;
        parse_structured(&response)
    }

    /// Send a prompt and stream the reply.
    ///
    /// Fails before any event when the prompt, config, user-turn persistence,
    /// or opening the upstream stream fails. The reply text is persisted once
    /// when the stream finishes, including after an error event; a canceled
    /// or dropped stream persists nothing.
    pub async fn send_message_stream(
        &self,
        prompt: &Prompt,
        override_config: Option<&GenerationConfig>,
    ) -> Result<ChatStream> {
        let turn = self.turn_lock.clone().lock_owned().await;

        let content = self.convert_prompt(prompt).await?;
        let config = self.request_config(override_config)?;
        self.persist_user_turn(prompt).await?;

        let model = self.model_for(prompt);
        let mut contents = self.turns.lock().await.clone();
        contents.push(content.clone());

        debug!(chat_id = %self.id(), model = %model, "Chat stream request");
        let upstream = self
            .inference
            .stream_generate_content(&model, &contents, &config)
            .await
            .map_err(|e| GenaiError::stream(format!("chat {} model {}", self.id(), model), e))?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let cancel = CancellationToken::new();
        let producer = StreamProducer {
            chat_id: self.id().to_string(),
            store: self.store.clone(),
            turns: self.turns.clone(),
            user_content: content,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(producer.run(upstream, turn));

        Ok(ChatStream::new(rx, cancel))
    }

    /// Return a tool's result for a function call the model made.
    ///
    /// The result is logged to history as a tool message and sent upstream as
    /// a function response. Non-object results are wrapped as `{"result": ..}`.
    pub async fn send_tool_response<R>(&self, call: &FunctionCall, result: &R) -> Result<ModelResponse>
    where
        R: Serialize + ?Sized,
    {
        let _turn = self.turn_lock.lock().await;

        let value = serde_json::to_value(result)?;
        let pretty = serde_json::to_string_pretty(&value)?;
        let config = self.request_config(None)?;

        let message = ChatMessage::tool(format!("Tool {:?} responded with: {}", call.name, pretty));
        if let Err(err) = self.store.append_message(self.id(), &message).await {
            warn!(chat_id = %self.id(), tool = %call.name, error = %err, "Failed to save tool response");
        }

        let response = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        let content = Content::user(vec![Part::function_response(call.name.clone(), response)]);

        self.exchange(content, self.model.clone(), &config).await
    }

    async fn convert_prompt(&self, prompt: &Prompt) -> Result<Content> {
        prompt_to_content(prompt)
            .await
            .map_err(|e| GenaiError::prompt_conversion(format!("chat {}", self.id()), e))
    }

    fn request_config(&self, override_config: Option<&GenerationConfig>) -> Result<GenerateContentConfig> {
        let merged = self.generation_config.merged(override_config);
        to_wire_config(&merged, self.system_instruction.clone()).map_err(|e| match e {
            GenaiError::ConfigConversion { .. } => e,
            other => GenaiError::config_conversion(format!("chat {}", self.id()), other),
        })
    }

    async fn persist_user_turn(&self, prompt: &Prompt) -> Result<()> {
        self.store
            .append_message(self.id(), &ChatMessage::user(prompt_log_text(prompt)))
            .await
            .map_err(|e| GenaiError::persistence(format!("save user message for chat {}", self.id()), e))
    }

    fn model_for(&self, prompt: &Prompt) -> String {
        prompt
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.model)
            .to_string()
    }

    /// One unary round trip: call upstream with the turn context plus
    /// `content`, record both turns, and save any reply text.
    async fn exchange(
        &self,
        content: Content,
        model: String,
        config: &GenerateContentConfig,
    ) -> Result<ModelResponse> {
        let mut contents = self.turns.lock().await.clone();
        contents.push(content.clone());

        debug!(chat_id = %self.id(), model = %model, turns = contents.len(), "Chat generate request");
        let response = self
            .inference
            .generate_content(&model, &contents, config)
            .await
            .map_err(|e| GenaiError::generate(format!("chat {} model {}", self.id(), model), e))?;
        let result = response_to_model_response(&response)?;

        let reply = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| Content::model(c.parts));
        {
            let mut turns = self.turns.lock().await;
            turns.push(content);
            turns.extend(reply);
        }

        if !result.text.is_empty() {
            if let Err(err) = self
                .store
                .append_message(self.id(), &ChatMessage::model(&result.text))
                .await
            {
                warn!(chat_id = %self.id(), error = %err, "Failed to save model reply");
            }
        }

        Ok(result)
    }
}
