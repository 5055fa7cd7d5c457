//! Conversions between caller-facing types and the Gemini wire format.

pub mod config;
pub mod history;
pub mod prompt;
pub mod response;
pub mod schema;
pub mod tool;

pub use config::{function_calling_mode, system_instruction, to_wire_config, tool_config_to_wire};
pub use history::{history_to_contents, message_to_content};
pub use prompt::{prompt_log_text, prompt_to_content};
pub use response::{candidates_to_response, response_to_model_response};
pub use schema::{resolve_schema, ObjectSchemaBuilder, SchemaType};
pub use tool::{tool_to_declaration, tools_to_wire};
