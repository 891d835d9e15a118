use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VideoIndexError;

/// Stored in place of a transcript that could not be fetched.
pub const TRANSCRIPT_SENTINEL: &str = "n/a";

// --- Stage records ---

/// One row of the `video-ids` artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    /// Raw RFC 3339 text from the search API. Typed later by the transformer.
    pub published_at: String,
    pub title: String,
}

/// One row of the `video-transcripts` artifact as written by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub video_id: String,
    pub published_at: String,
    pub title: String,
    pub transcript: String,
}

impl TranscriptRecord {
    pub fn new(video: VideoRecord, transcript: impl Into<String>) -> Self {
        Self {
            video_id: video.video_id,
            published_at: video.published_at,
            title: video.title,
            transcript: transcript.into(),
        }
    }

    pub fn has_transcript(&self) -> bool {
        self.transcript != TRANSCRIPT_SENTINEL
    }
}

/// A transcript row after text normalization and timestamp typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub video_id: String,
    /// `None` when the raw text did not parse.
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub transcript: String,
}

// --- Embedded fields ---

/// Text columns that receive embeddings, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Title,
    Transcript,
}

impl TextField {
    pub const ALL: [TextField; 2] = [TextField::Title, TextField::Transcript];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Transcript => "transcript",
        }
    }

    pub fn value<'a>(&self, record: &'a CleanRecord) -> &'a str {
        match self {
            TextField::Title => &record.title,
            TextField::Transcript => &record.transcript,
        }
    }

    /// `<field>_embedding-<index>`, e.g. `title_embedding-0`.
    pub fn embedding_column(&self, index: usize) -> String {
        format!("{}_embedding-{}", self.as_str(), index)
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embeddings for one text field across every row of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBlock {
    pub field: TextField,
    pub dimension: usize,
    /// One vector per row, each `dimension` long.
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingBlock {
    pub fn column_names(&self) -> Vec<String> {
        (0..self.dimension)
            .map(|i| self.field.embedding_column(i))
            .collect()
    }

    /// Values of a single dimension, one per row.
    pub fn column(&self, index: usize) -> Vec<f32> {
        self.vectors.iter().map(|v| v[index]).collect()
    }
}

// --- Final index ---

/// The `video-index` artifact: clean rows plus embedding blocks laid side by side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexTable {
    pub records: Vec<CleanRecord>,
    pub blocks: Vec<EmbeddingBlock>,
}

impl IndexTable {
    pub fn new(records: Vec<CleanRecord>) -> Self {
        Self {
            records,
            blocks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a block to the right of the existing columns.
    /// Rejects blocks whose shape does not match the table.
    pub fn hconcat(&mut self, block: EmbeddingBlock) -> Result<(), VideoIndexError> {
        if block.vectors.len() != self.records.len() {
            return Err(VideoIndexError::EmbeddingShape(format!(
                "{} block has {} rows, table has {}",
                block.field,
                block.vectors.len(),
                self.records.len()
            )));
        }
        if let Some((row, v)) = block
            .vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != block.dimension)
        {
            return Err(VideoIndexError::EmbeddingShape(format!(
                "{} row {row} has width {}, expected {}",
                block.field,
                v.len(),
                block.dimension
            )));
        }
        if self.blocks.iter().any(|b| b.field == block.field) {
            return Err(VideoIndexError::EmbeddingShape(format!(
                "{} embeddings already present",
                block.field
            )));
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn block(&self, field: TextField) -> Option<&EmbeddingBlock> {
        self.blocks.iter().find(|b| b.field == field)
    }

    pub fn embedding_column_names(&self) -> Vec<String> {
        self.blocks.iter().flat_map(|b| b.column_names()).collect()
    }

    pub fn embedding_column_count(&self) -> usize {
        self.blocks.iter().map(|b| b.dimension).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(id: &str) -> CleanRecord {
        CleanRecord {
            video_id: id.to_string(),
            published_at: None,
            title: format!("title {id}"),
            transcript: "n/a".to_string(),
        }
    }

    fn block(field: TextField, rows: usize, dim: usize) -> EmbeddingBlock {
        EmbeddingBlock {
            field,
            dimension: dim,
            vectors: vec![vec![0.5; dim]; rows],
        }
    }

    #[test]
    fn embedding_column_naming() {
        assert_eq!(TextField::Title.embedding_column(0), "title_embedding-0");
        assert_eq!(
            TextField::Transcript.embedding_column(383),
            "transcript_embedding-383"
        );
    }

    #[test]
    fn hconcat_orders_columns_by_insertion() {
        let mut table = IndexTable::new(vec![clean("a"), clean("b")]);
        table.hconcat(block(TextField::Title, 2, 3)).unwrap();
        table.hconcat(block(TextField::Transcript, 2, 3)).unwrap();

        assert_eq!(
            table.embedding_column_names(),
            vec![
                "title_embedding-0",
                "title_embedding-1",
                "title_embedding-2",
                "transcript_embedding-0",
                "transcript_embedding-1",
                "transcript_embedding-2",
            ]
        );
        assert_eq!(table.embedding_column_count(), 6);
    }

    #[test]
    fn hconcat_rejects_row_mismatch() {
        let mut table = IndexTable::new(vec![clean("a"), clean("b")]);
        let err = table.hconcat(block(TextField::Title, 1, 3)).unwrap_err();
        assert!(matches!(err, VideoIndexError::EmbeddingShape(_)));
        assert!(table.blocks.is_empty());
    }

    #[test]
    fn hconcat_rejects_ragged_vectors() {
        let mut table = IndexTable::new(vec![clean("a"), clean("b")]);
        let mut ragged = block(TextField::Title, 2, 3);
        ragged.vectors[1].pop();
        assert!(table.hconcat(ragged).is_err());
    }

    #[test]
    fn hconcat_rejects_duplicate_field() {
        let mut table = IndexTable::new(vec![clean("a")]);
        table.hconcat(block(TextField::Title, 1, 2)).unwrap();
        assert!(table.hconcat(block(TextField::Title, 1, 2)).is_err());
    }

    #[test]
    fn sentinel_transcript_detected() {
        let video = VideoRecord {
            video_id: "v".into(),
            published_at: "2024-01-01T00:00:00Z".into(),
            title: "t".into(),
        };
        assert!(!TranscriptRecord::new(video.clone(), TRANSCRIPT_SENTINEL).has_transcript());
        assert!(TranscriptRecord::new(video, "hello").has_transcript());
    }

    #[test]
    fn text_field_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TextField::Transcript).unwrap(),
            "\"transcript\""
        );
    }
}
