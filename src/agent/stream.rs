//! Streaming chat replies.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use crate::error::{GenaiError, Result};
use crate::provider::ContentStream;
use crate::store::Store;
use crate::types::{ChatMessage, FunctionCall, ModelResponse};
use crate::wire::{Content, Part};

/// Events buffered between the producer task and the consumer.
pub(crate) const STREAM_BUFFER: usize = 32;

/// One item of a streamed reply.
#[derive(Debug)]
pub enum ChatStreamEvent {
    /// A text fragment, in arrival order.
    TextDelta(String),
    /// A function call requested by the model.
    FunctionCall(FunctionCall),
    /// Upstream failed; no further events follow.
    Error(GenaiError),
    /// Normal completion with the assembled reply.
    Done(ModelResponse),
}

/// Consumer side of a streamed reply.
///
/// Dropping the stream or calling [`ChatStream::cancel`] stops the producer;
/// a canceled reply is not written to history.
#[derive(Debug)]
pub struct ChatStream {
    events: ReceiverStream<ChatStreamEvent>,
    cancel: CancellationToken,
    _drop_guard: DropGuard,
}

impl ChatStream {
    pub(crate) fn new(rx: mpsc::Receiver<ChatStreamEvent>, cancel: CancellationToken) -> Self {
        Self {
            events: ReceiverStream::new(rx),
            _drop_guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this stream, e.g. from a timeout task.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the stream into the final response.
    pub async fn into_response(mut self) -> Result<ModelResponse> {
        while let Some(event) = self.next().await {
            match event {
                ChatStreamEvent::Done(response) => return Ok(response),
                ChatStreamEvent::Error(err) => return Err(err),
                ChatStreamEvent::TextDelta(_) | ChatStreamEvent::FunctionCall(_) => {}
            }
        }
        Err(GenaiError::Canceled)
    }
}

impl Stream for ChatStream {
    type Item = ChatStreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

/// Task relaying upstream chunks into a [`ChatStream`].
pub(crate) struct StreamProducer {
    pub(crate) chat_id: String,
    pub(crate) store: Store,
    pub(crate) turns: Arc<Mutex<Vec<Content>>>,
    pub(crate) user_content: Content,
    pub(crate) tx: mpsc::Sender<ChatStreamEvent>,
    pub(crate) cancel: CancellationToken,
}

impl StreamProducer {
    /// Relay until upstream ends, fails, or the consumer goes away. The turn
    /// guard is held for the whole reply.
    pub(crate) async fn run(self, mut upstream: ContentStream, _turn: OwnedMutexGuard<()>) {
        let mut text = String::new();
        let mut calls: Vec<FunctionCall> = Vec::new();
        let mut finish_reason = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(chat_id = %self.chat_id, "Stream canceled, partial reply dropped");
                    return;
                }
                next = upstream.next() => next,
            };

            let chunk = match next {
                None => break,
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => {
                    self.persist_reply(&text).await;
                    let err = GenaiError::stream(format!("chat {}", self.chat_id), err);
                    self.emit(ChatStreamEvent::Error(err)).await;
                    return;
                }
            };

            let Some(candidate) = chunk.candidates.into_iter().next() else {
                continue;
            };
            if candidate.finish_reason.is_some() {
                finish_reason = candidate.finish_reason;
            }
            let Some(content) = candidate.content else {
                continue;
            };

            for part in content.parts {
                let event = if let Some(call) = part.function_call {
                    calls.push(call.clone());
                    ChatStreamEvent::FunctionCall(call)
                } else if let Some(delta) = part.text.filter(|t| !t.is_empty()) {
                    text.push_str(&delta);
                    ChatStreamEvent::TextDelta(delta)
                } else {
                    continue;
                };
                if !self.emit(event).await {
                    debug!(chat_id = %self.chat_id, "Stream consumer gone, partial reply dropped");
                    return;
                }
            }
        }

        self.persist_reply(&text).await;

        let mut model_parts = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            model_parts.push(Part::text(text.clone()));
        }
        model_parts.extend(calls.iter().cloned().map(Part::function_call));
        {
            let mut turns = self.turns.lock().await;
            turns.push(self.user_content.clone());
            if !model_parts.is_empty() {
                turns.push(Content::model(model_parts));
            }
        }

        let response = ModelResponse {
            text: text.trim().to_string(),
            function_call: calls.pop(),
            finish_reason,
        };
        self.emit(ChatStreamEvent::Done(response)).await;
    }

    /// Deliver one event unless the consumer cancels first. Every send goes
    /// through here so a full buffer never pins the turn lock.
    async fn emit(&self, event: ChatStreamEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(event) => sent.is_ok(),
        }
    }

    async fn persist_reply(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(err) = self
            .store
            .append_message(&self.chat_id, &ChatMessage::model(text))
            .await
        {
            warn!(chat_id = %self.chat_id, error = %err, "Failed to save streamed model reply");
        }
    }
}
