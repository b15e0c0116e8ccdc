use arbor_core::TranscriptMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Sampling settings for one model call. Reasoning stages override these per
/// stage; everything else uses the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

/// Receives incremental deltas while a response streams.
pub type ChunkHandler<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// One chat completion against a provider.
///
/// Implementations should stop early and return [`ModelError::Stream`] when
/// the token is cancelled mid-flight; callers re-check the token around the
/// await regardless, so a provider that ignores it still cannot leak a stale
/// response into visible state.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[TranscriptMessage],
        config: &ModelConfig,
        on_chunk: Option<ChunkHandler<'_>>,
        cancel: &CancellationToken,
    ) -> Result<String>;
}
