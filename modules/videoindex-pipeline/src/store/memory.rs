use std::sync::Mutex;

use anyhow::Result;

use videoindex_common::{CleanRecord, IndexTable, TranscriptRecord, VideoIndexError, VideoRecord};

use super::{clean_to_raw, Artifact, ArtifactStore};

/// The transcript artifact holds one encoding at a time, like the file does.
#[derive(Debug, Clone)]
enum TranscriptTable {
    Raw(Vec<TranscriptRecord>),
    Clean(Vec<CleanRecord>),
}

#[derive(Debug, Default)]
struct Tables {
    videos: Option<Vec<VideoRecord>>,
    transcripts: Option<TranscriptTable>,
    index: Option<IndexTable>,
}

/// In-memory [`ArtifactStore`]. Loading an artifact that was never saved is an
/// error, matching a missing file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the identity table, for running later stages in isolation.
    pub fn with_videos(self, rows: Vec<VideoRecord>) -> Self {
        self.lock().videos = Some(rows);
        self
    }

    /// Seed the raw transcript table.
    pub fn with_transcripts(self, rows: Vec<TranscriptRecord>) -> Self {
        self.lock().transcripts = Some(TranscriptTable::Raw(rows));
        self
    }

    pub fn contains(&self, artifact: Artifact) -> bool {
        let tables = self.lock();
        match artifact {
            Artifact::VideoIds => tables.videos.is_some(),
            Artifact::VideoTranscripts => tables.transcripts.is_some(),
            Artifact::VideoIndex => tables.index.is_some(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }
}

fn missing(artifact: Artifact) -> anyhow::Error {
    VideoIndexError::Artifact(format!("{artifact} has not been written")).into()
}

impl ArtifactStore for MemoryStore {
    fn save_videos(&self, rows: &[VideoRecord]) -> Result<()> {
        self.lock().videos = Some(rows.to_vec());
        Ok(())
    }

    fn load_videos(&self) -> Result<Vec<VideoRecord>> {
        self.lock()
            .videos
            .clone()
            .ok_or_else(|| missing(Artifact::VideoIds))
    }

    fn save_transcripts(&self, rows: &[TranscriptRecord]) -> Result<()> {
        self.lock().transcripts = Some(TranscriptTable::Raw(rows.to_vec()));
        Ok(())
    }

    fn load_transcripts(&self) -> Result<Vec<TranscriptRecord>> {
        match &self.lock().transcripts {
            Some(TranscriptTable::Raw(rows)) => Ok(rows.clone()),
            Some(TranscriptTable::Clean(rows)) => Ok(rows.iter().map(clean_to_raw).collect()),
            None => Err(missing(Artifact::VideoTranscripts)),
        }
    }

    fn save_clean_transcripts(&self, rows: &[CleanRecord]) -> Result<()> {
        self.lock().transcripts = Some(TranscriptTable::Clean(rows.to_vec()));
        Ok(())
    }

    fn load_clean_transcripts(&self) -> Result<Vec<CleanRecord>> {
        match &self.lock().transcripts {
            Some(TranscriptTable::Clean(rows)) => Ok(rows.clone()),
            Some(TranscriptTable::Raw(_)) => Err(VideoIndexError::Schema(format!(
                "{} has not been transformed (published_at is text)",
                Artifact::VideoTranscripts
            ))
            .into()),
            None => Err(missing(Artifact::VideoTranscripts)),
        }
    }

    fn save_index(&self, table: &IndexTable) -> Result<()> {
        self.lock().index = Some(table.clone());
        Ok(())
    }

    fn load_index(&self) -> Result<IndexTable> {
        self.lock()
            .index
            .clone()
            .ok_or_else(|| missing(Artifact::VideoIndex))
    }
}
