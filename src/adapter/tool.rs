//! Tool declarations to wire tools.

use crate::error::Result;
use crate::types::Tool;
use crate::wire::{FunctionDeclaration, WireTool};

use super::schema::resolve_schema;

pub fn tool_to_declaration(tool: &Tool) -> Result<FunctionDeclaration> {
    let parameters = match &tool.request {
        Some(config) => resolve_schema(config, &format!("tool {:?} request", tool.name))?,
        None => None,
    };
    let response = match &tool.response {
        Some(config) => resolve_schema(config, &format!("tool {:?} response", tool.name))?,
        None => None,
    };
    Ok(FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters,
        response,
    })
}

/// One wire tool per declared tool, in order.
pub fn tools_to_wire(tools: &[Tool]) -> Result<Vec<WireTool>> {
    tools
        .iter()
        .map(|tool| {
            Ok(WireTool {
                function_declarations: vec![tool_to_declaration(tool)?],
            })
        })
        .collect()
}
