//! genaiclient: stateful agents and chats over the Gemini API.
//!
//! Agents carry a persona, instructions, tools and default generation
//! settings. Chats bind an agent to a user and replay their persisted history
//! on every turn. Records and history live in a pluggable key-value store.
//!
//! # Quick Start
//!
//! ```no_run
//! use genaiclient::prelude::*;
//!
//! # async fn example() -> genaiclient::error::Result<()> {
//! let config = ClientConfig::from_env();
//! let client = GenaiClient::from_config(&config, Store::in_memory())?;
//!
//! let agent = client
//!     .new_agent(AgentConfig::builder().persona("a terse assistant").build())
//!     .await?;
//! let chat = agent
//!     .new_chat(ChatConfig::builder().user_id("user-1").build())
//!     .await?;
//! let reply = chat.send_message(&Prompt::from_text("Hi there!"), None).await?;
//! println!("{}", reply.text());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod store;
pub mod types;
pub mod wire;

pub use client::{EmbedOptions, GenaiClient};
