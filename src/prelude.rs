//! Convenience re-exports for common use.

pub use crate::agent::{Agent, ChatSession, ChatStream, ChatStreamEvent};
pub use crate::client::{EmbedOptions, GenaiClient};
pub use crate::config::{ClientConfig, ClientOptions};
pub use crate::error::{GenaiError, Result};
pub use crate::provider::InferenceClient;
pub use crate::store::{KeyValueBackend, MemoryBackend, Store};
pub use crate::types::{
    AgentConfig, ChatConfig, ChatMessage, ChatType, FileConfig, FunctionCall, GenerationConfig,
    MessageRole, ModelResponse, Prompt, SchemaConfig, Tool, ToolConfig, User,
};
pub use crate::wire::{Schema, SchemaKind};
