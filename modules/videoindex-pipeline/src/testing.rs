// Test mocks for the video index pipeline.
//
// Three mocks matching the network/model trait boundaries:
// - MockSearch (VideoSearch): page token to SearchPage, records every request
// - MockTranscripts (TranscriptSource): video id to caption lines or an error
// - FixedEmbedder (TextEmbedder): deterministic hash-based vectors
//
// ArtifactStore needs no mock; store::MemoryStore is the in-memory backend.
// Plus helpers for constructing search hits and pages.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use youtube_client::{SearchItem, SearchItemId, SearchPage, Snippet, VIDEO_KIND};

use crate::embedder::TextEmbedder;
use crate::traits::{CaptionFragment, TranscriptError, TranscriptSource, VideoSearch};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Standard embedding dimension for test vectors.
pub const TEST_EMBEDDING_DIM: usize = 16;

/// Channel id used across pipeline tests.
pub const TEST_CHANNEL: &str = "UCtestchannel";

// ---------------------------------------------------------------------------
// Search hit helpers
// ---------------------------------------------------------------------------

pub fn video_item(video_id: &str, published_at: &str, title: &str) -> SearchItem {
    SearchItem {
        id: SearchItemId {
            kind: VIDEO_KIND.to_string(),
            video_id: Some(video_id.to_string()),
            channel_id: None,
            playlist_id: None,
        },
        snippet: Some(Snippet {
            published_at: published_at.to_string(),
            title: title.to_string(),
            channel_id: Some(TEST_CHANNEL.to_string()),
        }),
    }
}

pub fn channel_item(channel_id: &str) -> SearchItem {
    SearchItem {
        id: SearchItemId {
            kind: "youtube#channel".to_string(),
            video_id: None,
            channel_id: Some(channel_id.to_string()),
            playlist_id: None,
        },
        snippet: Some(Snippet {
            published_at: "2020-01-01T00:00:00Z".to_string(),
            title: "Channel".to_string(),
            channel_id: Some(channel_id.to_string()),
        }),
    }
}

pub fn playlist_item(playlist_id: &str) -> SearchItem {
    SearchItem {
        id: SearchItemId {
            kind: "youtube#playlist".to_string(),
            video_id: None,
            channel_id: None,
            playlist_id: Some(playlist_id.to_string()),
        },
        snippet: None,
    }
}

pub fn search_page(items: Vec<SearchItem>, next: Option<&str>) -> SearchPage {
    SearchPage {
        items,
        next_page_token: next.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// MockSearch
// ---------------------------------------------------------------------------

/// Page-token keyed search. `None` is the first page. Returns `Err` for
/// unregistered tokens and for tokens registered with `.fail_on()`.
pub struct MockSearch {
    pages: HashMap<Option<String>, SearchPage>,
    failures: HashMap<Option<String>, String>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failures: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A single page with no continuation token.
    pub fn single_page(items: Vec<SearchItem>) -> Self {
        Self::new().on_page(None, search_page(items, None))
    }

    pub fn on_page(mut self, token: Option<&str>, page: SearchPage) -> Self {
        self.pages.insert(token.map(str::to_string), page);
        self
    }

    pub fn fail_on(mut self, token: Option<&str>, message: &str) -> Self {
        self.failures
            .insert(token.map(str::to_string), message.to_string());
        self
    }

    /// Every `(channel_id, page_token)` requested, in order.
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSearch for MockSearch {
    async fn search_page(&self, channel_id: &str, page_token: Option<&str>) -> Result<SearchPage> {
        let key = page_token.map(str::to_string);
        self.requests
            .lock()
            .unwrap()
            .push((channel_id.to_string(), key.clone()));

        if let Some(message) = self.failures.get(&key) {
            bail!("MockSearch: {message}");
        }
        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("MockSearch: no page registered for token {key:?}"))
    }
}

// ---------------------------------------------------------------------------
// MockTranscripts
// ---------------------------------------------------------------------------

/// Video-id keyed transcript source. Unregistered videos are `Unavailable`,
/// like a video with captions disabled.
pub struct MockTranscripts {
    transcripts: HashMap<String, Vec<CaptionFragment>>,
    errors: HashMap<String, TranscriptError>,
    calls: Mutex<Vec<String>>,
}

impl MockTranscripts {
    pub fn new() -> Self {
        Self {
            transcripts: HashMap::new(),
            errors: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_video(mut self, video_id: &str, lines: &[&str]) -> Self {
        let fragments = lines
            .iter()
            .enumerate()
            .map(|(i, line)| CaptionFragment {
                text: line.to_string(),
                start: i as f64 * 2.0,
                duration: 2.0,
            })
            .collect();
        self.transcripts.insert(video_id.to_string(), fragments);
        self
    }

    pub fn on_error(mut self, video_id: &str, error: TranscriptError) -> Self {
        self.errors.insert(video_id.to_string(), error);
        self
    }

    /// Video ids fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockTranscripts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for MockTranscripts {
    async fn fetch(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<CaptionFragment>, TranscriptError> {
        self.calls.lock().unwrap().push(video_id.to_string());

        if let Some(error) = self.errors.get(video_id) {
            return Err(error.clone());
        }
        self.transcripts
            .get(video_id)
            .cloned()
            .ok_or_else(|| TranscriptError::Unavailable {
                video_id: video_id.to_string(),
                reason: "Subtitles are disabled for this video".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// FixedEmbedder
// ---------------------------------------------------------------------------

/// Deterministic embedder for testing. Equal texts get equal vectors; each
/// vector is unit length. Records the size of every batch it is handed.
pub struct FixedEmbedder {
    dimension: usize,
    batches: Mutex<Vec<usize>>,
    fail: bool,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            batches: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// An embedder whose every batch errors, like a model that failed to load.
    pub fn failing(dimension: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dimension)
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    /// The vector `embed_batch` returns for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vec = vec![0.0f32; self.dimension];
        for v in vec.iter_mut() {
            // LCG
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *v = ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

#[async_trait]
impl TextEmbedder for FixedEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.len());
        if self.fail {
            bail!("FixedEmbedder: model unavailable");
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
