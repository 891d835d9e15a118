// Trait abstractions for the pipeline's external collaborators.
//
// VideoSearch        paged channel search (YouTube Data API)
// TranscriptSource   per-video caption fetch
// TextEmbedder       in embedder.rs, next to the model wrapper
// ArtifactStore      in store/, next to its Parquet and memory backends
//
// Mocks are in testing.rs and MemoryStore stands in for the files, so each
// stage runs with no network, no model download and no disk.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use youtube_client::{SearchPage, YouTubeClient};

// ---------------------------------------------------------------------------
// VideoSearch
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Fetch one page of a channel's videos. `None` requests the first page.
    async fn search_page(&self, channel_id: &str, page_token: Option<&str>) -> Result<SearchPage>;
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search_page(&self, channel_id: &str, page_token: Option<&str>) -> Result<SearchPage> {
        Ok(self.search_channel_page(channel_id, page_token).await?)
    }
}

// ---------------------------------------------------------------------------
// TranscriptSource
// ---------------------------------------------------------------------------

/// One caption line as returned by the transcript service.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFragment {
    pub text: String,
    /// Offset into the video, in seconds.
    pub start: f64,
    pub duration: f64,
}

impl CaptionFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: 0.0,
            duration: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscriptError {
    /// The service answered, but has no usable transcript for this video
    /// (captions disabled, none in the requested language, video unavailable).
    #[error("No transcript for {video_id}: {reason}")]
    Unavailable { video_id: String, reason: String },

    /// The request itself failed before the service could answer.
    #[error("Transcript request failed for {video_id}: {reason}")]
    Request { video_id: String, reason: String },
}

impl TranscriptError {
    pub fn video_id(&self) -> &str {
        match self {
            TranscriptError::Unavailable { video_id, .. } => video_id,
            TranscriptError::Request { video_id, .. } => video_id,
        }
    }
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<CaptionFragment>, TranscriptError>;
}
