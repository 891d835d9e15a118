//! Stage 2: one transcript per listed video, with the sentinel standing in for failures.

use anyhow::Result;
use tracing::{info, warn};

use videoindex_common::{TranscriptRecord, VideoRecord, TRANSCRIPT_SENTINEL};

use crate::store::ArtifactStore;
use crate::traits::{CaptionFragment, TranscriptError, TranscriptSource};

/// Result of one transcript attempt. Callers that only need the stored text use
/// [`TranscriptOutcome::into_text`]; the failure reason stays available for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptOutcome {
    Fetched(String),
    Missing(TranscriptError),
}

impl TranscriptOutcome {
    pub fn from_fragments(
        result: std::result::Result<Vec<CaptionFragment>, TranscriptError>,
    ) -> Self {
        match result {
            Ok(fragments) => TranscriptOutcome::Fetched(join_fragments(&fragments)),
            Err(e) => TranscriptOutcome::Missing(e),
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, TranscriptOutcome::Fetched(_))
    }

    pub fn into_text(self) -> String {
        match self {
            TranscriptOutcome::Fetched(text) => text,
            TranscriptOutcome::Missing(_) => TRANSCRIPT_SENTINEL.to_string(),
        }
    }
}

/// Caption text in service order, separated by single spaces.
pub fn join_fragments(fragments: &[CaptionFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranscriptStats {
    pub videos: u32,
    pub fetched: u32,
    pub missing: u32,
}

/// Fetch transcripts one video at a time. Never fails: a video whose fetch
/// errors gets the sentinel and the batch continues.
pub async fn fetch_transcripts(
    source: &dyn TranscriptSource,
    videos: Vec<VideoRecord>,
) -> (Vec<TranscriptRecord>, TranscriptStats) {
    let mut stats = TranscriptStats::default();
    let mut rows = Vec::with_capacity(videos.len());

    for video in videos {
        stats.videos += 1;
        let outcome = TranscriptOutcome::from_fragments(source.fetch(&video.video_id).await);
        match &outcome {
            TranscriptOutcome::Fetched(_) => stats.fetched += 1,
            TranscriptOutcome::Missing(e) => {
                warn!(video_id = %video.video_id, error = %e, "Transcript unavailable");
                stats.missing += 1;
            }
        }
        rows.push(TranscriptRecord::new(video, outcome.into_text()));
    }

    (rows, stats)
}

/// Read `video-ids`, fetch every transcript, overwrite `video-transcripts`.
pub async fn run(
    source: &dyn TranscriptSource,
    store: &dyn ArtifactStore,
) -> Result<TranscriptStats> {
    let videos = store.load_videos()?;
    info!(videos = videos.len(), "Fetching transcripts");

    let (rows, stats) = fetch_transcripts(source, videos).await;
    store.save_transcripts(&rows)?;
    info!(
        fetched = stats.fetched,
        missing = stats.missing,
        "Transcripts saved"
    );
    Ok(stats)
}
