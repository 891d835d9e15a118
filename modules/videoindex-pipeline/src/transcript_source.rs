use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;
use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::traits::{CaptionFragment, TranscriptError, TranscriptSource};

/// Caption fetcher backed by `yt-transcript-rs`. English captions, formatting stripped.
pub struct YtTranscriptSource {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl YtTranscriptSource {
    pub fn new() -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| anyhow!("Failed to build transcript client: {e}"))?;
        Ok(Self {
            api,
            languages: vec!["en".to_string()],
        })
    }

    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.languages = languages.iter().map(|l| l.to_string()).collect();
        self
    }
}

#[async_trait]
impl TranscriptSource for YtTranscriptSource {
    async fn fetch(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<CaptionFragment>, TranscriptError> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let transcript = self
            .api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|e| TranscriptError::Unavailable {
                video_id: video_id.to_string(),
                reason: e.to_string(),
            })?;

        debug!(
            video_id,
            language = %transcript.language_code,
            generated = transcript.is_generated,
            snippets = transcript.snippets.len(),
            "Transcript fetched"
        );

        Ok(transcript
            .snippets
            .into_iter()
            .map(|s| CaptionFragment {
                text: s.text,
                start: s.start,
                duration: s.duration,
            })
            .collect())
    }
}
