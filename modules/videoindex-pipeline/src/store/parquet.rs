// Parquet persistence for the three pipeline tables.
//
// Writes go to `<name>.parquet.tmp` and are renamed into place, so a crash mid-write
// leaves the previous artifact intact.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{
    Array, ArrayRef, Float32Array, RecordBatch, StringArray, TimestampMicrosecondArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use chrono::{DateTime, TimeZone, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use videoindex_common::{
    CleanRecord, EmbeddingBlock, IndexTable, TextField, TranscriptRecord, VideoIndexError,
    VideoRecord,
};

use super::{render_published_at, Artifact, ArtifactStore};

const UTC: &str = "UTC";

/// Artifacts as Parquet files under one directory, e.g. `data/video-ids.parquet`.
pub struct ParquetStore {
    dir: PathBuf,
}

impl ParquetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    fn write(&self, artifact: Artifact, batch: &RecordBatch) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data dir {}", self.dir.display()))?;

        let path = self.path(artifact);
        let tmp = path.with_extension("parquet.tmp");
        write_batch(&tmp, batch).with_context(|| format!("Failed to write {artifact}"))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move {} into place", tmp.display()))?;

        debug!(
            %artifact,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "Artifact written"
        );
        Ok(())
    }

    fn read(&self, artifact: Artifact) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        let path = self.path(artifact);
        let file = File::open(&path).map_err(|e| {
            VideoIndexError::Artifact(format!("Cannot open {}: {e}", path.display()))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("{artifact} is not a readable Parquet file"))?;
        let schema = builder.schema().clone();
        let batches = builder
            .build()?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to decode {artifact}"))?;

        Ok((schema, batches))
    }
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Column helpers
// ---------------------------------------------------------------------------

fn schema_error(message: String) -> anyhow::Error {
    VideoIndexError::Schema(message).into()
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    artifact: Artifact,
) -> Result<&'a T> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| schema_error(format!("{artifact} is missing column {name}")))?;
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        schema_error(format!(
            "{artifact} column {name} has unexpected type {}",
            col.data_type()
        ))
    })
}

fn text(array: &StringArray, row: usize) -> String {
    if array.is_null(row) {
        String::new()
    } else {
        array.value(row).to_string()
    }
}

fn timestamp(array: &TimestampMicrosecondArray, row: usize) -> Option<DateTime<Utc>> {
    if array.is_null(row) {
        return None;
    }
    Utc.timestamp_micros(array.value(row)).single()
}

fn utf8(name: &str) -> Field {
    Field::new(name, DataType::Utf8, false)
}

fn published_at_field() -> Field {
    Field::new(
        "published_at",
        DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into())),
        true,
    )
}

fn string_array<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn timestamp_array(values: impl Iterator<Item = Option<DateTime<Utc>>>) -> ArrayRef {
    let micros: Vec<Option<i64>> = values.map(|t| t.map(|t| t.timestamp_micros())).collect();
    Arc::new(TimestampMicrosecondArray::from(micros).with_timezone(UTC))
}

/// Columns shared by the transformed transcript table and the index.
fn clean_columns(rows: &[CleanRecord]) -> (Vec<Field>, Vec<ArrayRef>) {
    let fields = vec![
        utf8("video_id"),
        published_at_field(),
        utf8("title"),
        utf8("transcript"),
    ];
    let columns = vec![
        string_array(rows.iter().map(|r| r.video_id.as_str())),
        timestamp_array(rows.iter().map(|r| r.published_at)),
        string_array(rows.iter().map(|r| r.title.as_str())),
        string_array(rows.iter().map(|r| r.transcript.as_str())),
    ];
    (fields, columns)
}

fn read_clean_rows(batches: &[RecordBatch], artifact: Artifact) -> Result<Vec<CleanRecord>> {
    let mut rows = Vec::new();
    for batch in batches {
        let ids = column::<StringArray>(batch, "video_id", artifact)?;
        let titles = column::<StringArray>(batch, "title", artifact)?;
        let transcripts = column::<StringArray>(batch, "transcript", artifact)?;
        let published = batch
            .column_by_name("published_at")
            .ok_or_else(|| schema_error(format!("{artifact} is missing column published_at")))?;
        let published = published
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .ok_or_else(|| {
                schema_error(format!(
                    "{artifact} has not been transformed (published_at is {})",
                    published.data_type()
                ))
            })?;

        for i in 0..batch.num_rows() {
            rows.push(CleanRecord {
                video_id: text(ids, i),
                published_at: timestamp(published, i),
                title: text(titles, i),
                transcript: text(transcripts, i),
            });
        }
    }
    Ok(rows)
}

/// Embedding column positions for one field, ordered by dimension index.
/// Requires indices to run 0..n with no gaps.
fn embedding_columns(schema: &Schema, field: TextField) -> Result<Vec<String>> {
    let prefix = format!("{}_embedding-", field.as_str());
    let mut found: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .filter_map(|f| {
            let index = f.name().strip_prefix(&prefix)?.parse::<usize>().ok()?;
            Some((index, f.name().clone()))
        })
        .collect();
    found.sort_by_key(|(index, _)| *index);

    if let Some((position, (index, _))) = found
        .iter()
        .enumerate()
        .find(|(position, (index, _))| position != index)
    {
        return Err(schema_error(format!(
            "{field} embedding columns are not contiguous: expected index {position}, found {index}"
        )));
    }

    Ok(found.into_iter().map(|(_, name)| name).collect())
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

impl ArtifactStore for ParquetStore {
    fn save_videos(&self, rows: &[VideoRecord]) -> Result<()> {
        let schema = Schema::new(vec![utf8("video_id"), utf8("published_at"), utf8("title")]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                string_array(rows.iter().map(|r| r.video_id.as_str())),
                string_array(rows.iter().map(|r| r.published_at.as_str())),
                string_array(rows.iter().map(|r| r.title.as_str())),
            ],
        )?;
        self.write(Artifact::VideoIds, &batch)
    }

    fn load_videos(&self) -> Result<Vec<VideoRecord>> {
        let artifact = Artifact::VideoIds;
        let (_, batches) = self.read(artifact)?;

        let mut rows = Vec::new();
        for batch in &batches {
            let ids = column::<StringArray>(batch, "video_id", artifact)?;
            let published = column::<StringArray>(batch, "published_at", artifact)?;
            let titles = column::<StringArray>(batch, "title", artifact)?;
            for i in 0..batch.num_rows() {
                rows.push(VideoRecord {
                    video_id: text(ids, i),
                    published_at: text(published, i),
                    title: text(titles, i),
                });
            }
        }
        Ok(rows)
    }

    fn save_transcripts(&self, rows: &[TranscriptRecord]) -> Result<()> {
        let schema = Schema::new(vec![
            utf8("video_id"),
            utf8("published_at"),
            utf8("title"),
            utf8("transcript"),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                string_array(rows.iter().map(|r| r.video_id.as_str())),
                string_array(rows.iter().map(|r| r.published_at.as_str())),
                string_array(rows.iter().map(|r| r.title.as_str())),
                string_array(rows.iter().map(|r| r.transcript.as_str())),
            ],
        )?;
        self.write(Artifact::VideoTranscripts, &batch)
    }

    fn load_transcripts(&self) -> Result<Vec<TranscriptRecord>> {
        let artifact = Artifact::VideoTranscripts;
        let (_, batches) = self.read(artifact)?;

        let mut rows = Vec::new();
        for batch in &batches {
            let ids = column::<StringArray>(batch, "video_id", artifact)?;
            let titles = column::<StringArray>(batch, "title", artifact)?;
            let transcripts = column::<StringArray>(batch, "transcript", artifact)?;
            let published = batch.column_by_name("published_at").ok_or_else(|| {
                schema_error(format!("{artifact} is missing column published_at"))
            })?;

            let published_text: Vec<String> = match published.data_type() {
                DataType::Utf8 => {
                    let array = column::<StringArray>(batch, "published_at", artifact)?;
                    (0..batch.num_rows()).map(|i| text(array, i)).collect()
                }
                DataType::Timestamp(TimeUnit::Microsecond, _) => {
                    let array =
                        column::<TimestampMicrosecondArray>(batch, "published_at", artifact)?;
                    (0..batch.num_rows())
                        .map(|i| render_published_at(timestamp(array, i)))
                        .collect()
                }
                other => {
                    return Err(schema_error(format!(
                        "{artifact} column published_at has unexpected type {other}"
                    )))
                }
            };

            for (i, published_at) in published_text.into_iter().enumerate() {
                rows.push(TranscriptRecord {
                    video_id: text(ids, i),
                    published_at,
                    title: text(titles, i),
                    transcript: text(transcripts, i),
                });
            }
        }
        Ok(rows)
    }

    fn save_clean_transcripts(&self, rows: &[CleanRecord]) -> Result<()> {
        let (fields, columns) = clean_columns(rows);
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        self.write(Artifact::VideoTranscripts, &batch)
    }

    fn load_clean_transcripts(&self) -> Result<Vec<CleanRecord>> {
        let artifact = Artifact::VideoTranscripts;
        let (_, batches) = self.read(artifact)?;
        read_clean_rows(&batches, artifact)
    }

    fn save_index(&self, table: &IndexTable) -> Result<()> {
        let (mut fields, mut columns) = clean_columns(&table.records);
        for block in &table.blocks {
            for (index, name) in block.column_names().into_iter().enumerate() {
                fields.push(Field::new(name, DataType::Float32, false));
                columns.push(Arc::new(Float32Array::from(block.column(index))));
            }
        }
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        self.write(Artifact::VideoIndex, &batch)
    }

    fn load_index(&self) -> Result<IndexTable> {
        let artifact = Artifact::VideoIndex;
        let (schema, batches) = self.read(artifact)?;
        let mut table = IndexTable::new(read_clean_rows(&batches, artifact)?);

        for field in TextField::ALL {
            let names = embedding_columns(&schema, field)?;
            if names.is_empty() {
                continue;
            }

            let mut vectors = Vec::with_capacity(table.len());
            for batch in &batches {
                let arrays = names
                    .iter()
                    .map(|name| column::<Float32Array>(batch, name, artifact))
                    .collect::<Result<Vec<_>>>()?;
                for row in 0..batch.num_rows() {
                    vectors.push(arrays.iter().map(|a| a.value(row)).collect());
                }
            }

            table.hconcat(EmbeddingBlock {
                field,
                dimension: names.len(),
                vectors,
            })?;
        }

        Ok(table)
    }
}
