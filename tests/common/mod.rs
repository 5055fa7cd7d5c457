//! Shared test helpers: a scripted inference client and a failing store backend.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};

use genaiclient::config::ClientOptions;
use genaiclient::error::{GenaiError, Result};
use genaiclient::provider::{ContentStream, InferenceClient};
use genaiclient::store::{KeyValueBackend, MemoryBackend, Store, StoreError, StoreResult};
use genaiclient::types::FunctionCall;
use genaiclient::wire::{
    Candidate, Content, ContentEmbedding, EmbedContentConfig, EmbedContentResponse,
    GenerateContentConfig, GenerateContentResponse, Part,
};
use genaiclient::GenaiClient;

/// One captured `generate_content` / `stream_generate_content` call.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub config: GenerateContentConfig,
}

/// One captured `embed_content` call.
#[derive(Debug, Clone)]
pub struct CapturedEmbed {
    pub model: String,
    pub text: String,
    pub config: Option<EmbedContentConfig>,
}

/// A scripted stream reply.
pub enum MockStream {
    /// Emits the chunks, then ends.
    Complete(Vec<Result<GenerateContentResponse>>),
    /// Emits the chunks, then never ends.
    Hanging(Vec<Result<GenerateContentResponse>>),
}

/// Inference client that replays queued responses.
#[derive(Default)]
pub struct MockInference {
    responses: Mutex<VecDeque<Result<GenerateContentResponse>>>,
    streams: Mutex<VecDeque<MockStream>>,
    embeddings: Mutex<VecDeque<Result<Vec<f32>>>>,
    requests: Mutex<Vec<CapturedRequest>>,
    embeds: Mutex<Vec<CapturedEmbed>>,
    calls: AtomicUsize,
}

impl MockInference {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_text(&self, text: &str) {
        self.queue_response(Ok(text_response(text)));
    }

    pub fn queue_function_call(&self, name: &str, args: Value) {
        self.queue_response(Ok(function_call_response(name, args)));
    }

    pub fn queue_response(&self, response: Result<GenerateContentResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn queue_stream(&self, stream: MockStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn queue_embedding(&self, embedding: Result<Vec<f32>>) {
        self.embeddings.lock().unwrap().push_back(embedding);
    }

    /// Upstream calls made so far, of any kind.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request captured")
    }

    pub fn embeds(&self) -> Vec<CapturedEmbed> {
        self.embeds.lock().unwrap().clone()
    }

    fn capture(&self, model: &str, contents: &[Content], config: &GenerateContentConfig) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(CapturedRequest {
            model: model.to_string(),
            contents: contents.to_vec(),
            config: config.clone(),
        });
    }
}

#[async_trait]
impl InferenceClient for MockInference {
    async fn generate_content(
        &self,
        model: &str,
        contents: &[Content],
        config: &GenerateContentConfig,
    ) -> Result<GenerateContentResponse> {
        self.capture(model, contents, config);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenaiError::api(500, "no response queued")))
    }

    async fn stream_generate_content(
        &self,
        model: &str,
        contents: &[Content],
        config: &GenerateContentConfig,
    ) -> Result<ContentStream> {
        self.capture(model, contents, config);
        match self.streams.lock().unwrap().pop_front() {
            Some(MockStream::Complete(chunks)) => Ok(stream::iter(chunks).boxed()),
            Some(MockStream::Hanging(chunks)) => {
                Ok(stream::iter(chunks).chain(stream::pending()).boxed())
            }
            None => Err(GenaiError::api(500, "no stream queued")),
        }
    }

    async fn embed_content(
        &self,
        model: &str,
        contents: &[Content],
        config: Option<&EmbedContentConfig>,
    ) -> Result<EmbedContentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.clone())
            .collect::<String>();
        self.embeds.lock().unwrap().push(CapturedEmbed {
            model: model.to_string(),
            text,
            config: config.cloned(),
        });
        let values = self
            .embeddings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenaiError::api(500, "no embedding queued")))?;
        Ok(EmbedContentResponse {
            embeddings: vec![ContentEmbedding { values }],
        })
    }
}

/// Memory backend whose writes can be switched to fail.
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    fail_writes: AtomicBool,
}

impl FlakyBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("backend offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueBackend for FlakyBackend {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.check_write()?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        self.check_write()?;
        self.inner.delete(keys).await
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.check_write()?;
        self.inner.set_add(key, member).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        self.check_write()?;
        self.inner.set_remove(key, member).await
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.inner.set_members(key).await
    }

    async fn list_push(&self, key: &str, value: String) -> StoreResult<()> {
        self.check_write()?;
        self.inner.list_push(key, value).await
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        self.inner.list_range(key, start, stop).await
    }
}

pub fn client_with(inference: Arc<MockInference>, store: Store) -> GenaiClient {
    GenaiClient::new(inference, store, ClientOptions::default())
}

/// Client over a mock and a fresh in-memory store.
pub fn mock_client() -> (GenaiClient, Arc<MockInference>) {
    let inference = MockInference::new();
    (client_with(inference.clone(), Store::in_memory()), inference)
}

pub fn response_with_parts(parts: Vec<Part>, finish_reason: Option<&str>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content::model(parts)),
            finish_reason: finish_reason.map(str::to_string),
            index: Some(0),
        }],
        ..Default::default()
    }
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    response_with_parts(vec![Part::text(text)], Some("STOP"))
}

/// A streaming chunk carrying one text fragment and no finish reason.
pub fn text_chunk(text: &str) -> GenerateContentResponse {
    response_with_parts(vec![Part::text(text)], None)
}

pub fn function_call_response(name: &str, args: Value) -> GenerateContentResponse {
    let args = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    response_with_parts(
        vec![Part::function_call(FunctionCall::new(name, args))],
        Some("STOP"),
    )
}

/// Text of every part of a content, concatenated.
pub fn content_text(content: &Content) -> String {
    content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect()
}
