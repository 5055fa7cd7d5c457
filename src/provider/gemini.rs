//! Google Gemini REST client.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::{GenaiError, Result};
use crate::wire::{
    Content, ContentEmbedding, EmbedContentConfig, EmbedContentResponse, GenerateContentConfig,
    GenerateContentResponse, Schema, WireTool, WireToolConfig,
};

use super::http::{build_client, gemini_headers, parse_sse_data, shared_client, status_to_error};
use super::{ContentStream, InferenceClient};

/// [`InferenceClient`] backed by `generativelanguage.googleapis.com`.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: shared_client().clone(),
        }
    }

    /// Build from config. Fails when no API key is configured.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GenaiError::Configuration("missing API key (set GEMINI_API_KEY)".to_string())
        })?;
        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: build_client(config.request_timeout)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(url)
            .headers(gemini_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }
        Ok(resp)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<&'a Content>,
    #[serde(skip_serializing_if = "<[WireTool]>::is_empty")]
    tools: &'a [WireTool],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<&'a WireToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationParams<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop_sequences: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Schema>,
}

impl<'a> GenerationParams<'a> {
    fn from_config(config: &'a GenerateContentConfig) -> Option<Self> {
        let params = Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            stop_sequences: &config.stop_sequences,
            response_mime_type: config.response_mime_type.as_deref(),
            response_schema: config.response_schema.as_ref(),
        };
        let empty = params.temperature.is_none()
            && params.top_p.is_none()
            && params.top_k.is_none()
            && params.max_output_tokens.is_none()
            && params.stop_sequences.is_empty()
            && params.response_mime_type.is_none()
            && params.response_schema.is_none();
        (!empty).then_some(params)
    }
}

fn request_body<'a>(
    contents: &'a [Content],
    config: &'a GenerateContentConfig,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents,
        system_instruction: config.system_instruction.as_ref(),
        tools: &config.tools,
        tool_config: config.tool_config.as_ref(),
        generation_config: GenerationParams::from_config(config),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    content: &'a Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<u32>,
}

impl<'a> EmbedRequest<'a> {
    fn new(model: Option<String>, content: &'a Content, config: Option<&'a EmbedContentConfig>) -> Self {
        Self {
            model,
            content,
            task_type: config.and_then(|c| c.task_type.as_deref()),
            title: config.and_then(|c| c.title.as_deref()),
            output_dimensionality: config.and_then(|c| c.output_dimensionality),
        }
    }
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

/// Decode one complete SSE line. Lines are split on raw bytes first so a
/// multi-byte character spanning two network chunks stays intact.
fn decode_sse_line(line: &[u8]) -> Option<Result<GenerateContentResponse>> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line,
        Err(e) => {
            return Some(Err(GenaiError::stream(
                "decoding SSE line",
                GenaiError::Validation(e.to_string()),
            )))
        }
    };
    let data = parse_sse_data(line.trim())?;
    Some(serde_json::from_str(data).map_err(GenaiError::Serialization))
}

#[derive(Deserialize)]
struct SingleEmbedResponse {
    embedding: ContentEmbedding,
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        contents: &[Content],
        config: &GenerateContentConfig,
    ) -> Result<GenerateContentResponse> {
        debug!(model, turns = contents.len(), "Gemini generateContent");
        let resp = self
            .post(&self.url(model, "generateContent"), &request_body(contents, config))
            .await?;
        Ok(resp.json().await?)
    }

    async fn stream_generate_content(
        &self,
        model: &str,
        contents: &[Content],
        config: &GenerateContentConfig,
    ) -> Result<ContentStream> {
        debug!(model, turns = contents.len(), "Gemini streamGenerateContent");
        let url = format!("{}?alt=sse", self.url(model, "streamGenerateContent"));
        let resp = self.post(&url, &request_body(contents, config)).await?;
        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(GenaiError::Network(e));
                        return;
                    }
                };

                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    match decode_sse_line(&line) {
                        Some(Ok(chunk)) => yield Ok(chunk),
                        Some(Err(e)) => {
                            yield Err(e);
                            return;
                        }
                        None => {}
                    }
                }
            }

            if let Some(result) = decode_sse_line(&buffer) {
                yield result;
            }
        };

        Ok(Box::pin(stream))
    }

    async fn embed_content(
        &self,
        model: &str,
        contents: &[Content],
        config: Option<&EmbedContentConfig>,
    ) -> Result<EmbedContentResponse> {
        debug!(model, inputs = contents.len(), "Gemini embed");
        match contents {
            [] => Ok(EmbedContentResponse::default()),
            [content] => {
                let body = EmbedRequest::new(None, content, config);
                let resp = self.post(&self.url(model, "embedContent"), &body).await?;
                let single: SingleEmbedResponse = resp.json().await?;
                Ok(EmbedContentResponse {
                    embeddings: vec![single.embedding],
                })
            }
            many => {
                let model_name = format!("models/{}", model.strip_prefix("models/").unwrap_or(model));
                let body = BatchEmbedRequest {
                    requests: many
                        .iter()
                        .map(|c| EmbedRequest::new(Some(model_name.clone()), c, config))
                        .collect(),
                };
                let resp = self.post(&self.url(model, "batchEmbedContents"), &body).await?;
                Ok(resp.json().await?)
            }
        }
    }
}
