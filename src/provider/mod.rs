//! Inference client trait and the Gemini REST implementation.

pub mod http;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::wire::{
    Content, EmbedContentConfig, EmbedContentResponse, GenerateContentConfig,
    GenerateContentResponse,
};

/// Stream of partial responses from `stream_generate_content`.
pub type ContentStream = BoxStream<'static, Result<GenerateContentResponse>>;

/// The remote model API as seen by agents and chats.
///
/// Implementations must be shareable across tasks; one instance serves every
/// chat of a client.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        contents: &[Content],
        config: &GenerateContentConfig,
    ) -> Result<GenerateContentResponse>;

    /// Open a streaming generate call. Errors before the first chunk are
    /// returned directly; later failures arrive as stream items.
    async fn stream_generate_content(
        &self,
        model: &str,
        contents: &[Content],
        config: &GenerateContentConfig,
    ) -> Result<ContentStream>;

    /// Embed each content; the response holds one embedding per input.
    async fn embed_content(
        &self,
        model: &str,
        contents: &[Content],
        config: Option<&EmbedContentConfig>,
    ) -> Result<EmbedContentResponse>;
}
