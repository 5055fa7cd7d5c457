//! Wire candidates to model responses.

use crate::error::{GenaiError, Result};
use crate::types::ModelResponse;
use crate::wire::{Candidate, GenerateContentResponse};

/// Normalize the first candidate into a [`ModelResponse`].
///
/// Text parts are joined with newlines and trimmed. A function-call part sets
/// `function_call` (the last one wins). Part kinds without a typed field are
/// kept as their JSON text. Other candidates are ignored.
pub fn candidates_to_response(candidates: &[Candidate]) -> Result<ModelResponse> {
    let candidate = candidates
        .first()
        .ok_or_else(|| GenaiError::EmptyResponse("no candidates".to_string()))?;
    let content = candidate
        .content
        .as_ref()
        .filter(|c| !c.parts.is_empty())
        .ok_or_else(|| GenaiError::EmptyResponse("candidate has no content".to_string()))?;

    let mut response = ModelResponse {
        finish_reason: candidate.finish_reason.clone(),
        ..Default::default()
    };
    let mut texts = Vec::new();

    for part in &content.parts {
        if let Some(call) = &part.function_call {
            response.function_call = Some(call.clone());
        } else if let Some(text) = &part.text {
            texts.push(text.clone());
        } else {
            texts.push(serde_json::to_string(part)?);
        }
    }

    response.text = texts.join("\n").trim().to_string();
    Ok(response)
}

pub fn response_to_model_response(response: &GenerateContentResponse) -> Result<ModelResponse> {
    candidates_to_response(&response.candidates)
}
