//! Stage handoff. Each stage loads the previous stage's artifact and saves its own
//! through [`ArtifactStore`], so stages can run against files or in-memory fixtures.

mod memory;
mod parquet;

pub use memory::MemoryStore;
pub use parquet::ParquetStore;

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};

use videoindex_common::{CleanRecord, IndexTable, TranscriptRecord, VideoRecord};

/// The three persisted tables. `VideoTranscripts` is written twice per run:
/// once by the fetcher, then overwritten by the transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    VideoIds,
    VideoTranscripts,
    VideoIndex,
}

impl Artifact {
    pub fn name(&self) -> &'static str {
        match self {
            Artifact::VideoIds => "video-ids",
            Artifact::VideoTranscripts => "video-transcripts",
            Artifact::VideoIndex => "video-index",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.parquet", self.name())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait ArtifactStore: Send + Sync {
    fn save_videos(&self, rows: &[VideoRecord]) -> Result<()>;
    fn load_videos(&self) -> Result<Vec<VideoRecord>>;

    fn save_transcripts(&self, rows: &[TranscriptRecord]) -> Result<()>;
    /// Loads the transcript artifact with `published_at` as text. Accepts the
    /// transformed encoding too, rendering timestamps back to RFC 3339.
    fn load_transcripts(&self) -> Result<Vec<TranscriptRecord>>;

    /// Overwrites the transcript artifact with typed timestamps.
    fn save_clean_transcripts(&self, rows: &[CleanRecord]) -> Result<()>;
    /// Fails if the transcript artifact has not been transformed yet.
    fn load_clean_transcripts(&self) -> Result<Vec<CleanRecord>>;

    fn save_index(&self, table: &IndexTable) -> Result<()>;
    fn load_index(&self) -> Result<IndexTable>;
}

/// Text form of a typed publish date. Null renders as an empty string,
/// which the transformer's parse turns back into null.
pub(crate) fn render_published_at(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}

pub(crate) fn clean_to_raw(row: &CleanRecord) -> TranscriptRecord {
    TranscriptRecord {
        video_id: row.video_id.clone(),
        published_at: render_published_at(row.published_at),
        title: row.title.clone(),
        transcript: row.transcript.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn artifact_file_names() {
        assert_eq!(Artifact::VideoIds.file_name(), "video-ids.parquet");
        assert_eq!(Artifact::VideoTranscripts.file_name(), "video-transcripts.parquet");
        assert_eq!(Artifact::VideoIndex.file_name(), "video-index.parquet");
    }

    #[test]
    fn published_at_renders_with_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 6).unwrap();
        assert_eq!(render_published_at(Some(ts)), "2024-01-10T15:00:06Z");
        assert_eq!(render_published_at(None), "");
    }
}
