//! Stage 4: embed title and transcript columns and write the final index.

use anyhow::{Context, Result};
use tracing::info;

use videoindex_common::{CleanRecord, EmbeddingBlock, IndexTable, TextField};

use crate::embedder::TextEmbedder;
use crate::store::ArtifactStore;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmbeddingStats {
    pub rows: u32,
    pub dimension: usize,
    pub columns_added: usize,
}

/// Encode one text column in a single batch call.
pub async fn embed_field(
    embedder: &dyn TextEmbedder,
    records: &[CleanRecord],
    field: TextField,
) -> Result<EmbeddingBlock> {
    let dimension = embedder.dimension();
    if records.is_empty() {
        return Ok(EmbeddingBlock {
            field,
            dimension,
            vectors: Vec::new(),
        });
    }

    let texts: Vec<String> = records.iter().map(|r| field.value(r).to_string()).collect();
    let vectors = embedder
        .embed_batch(texts)
        .await
        .with_context(|| format!("Failed to embed {field} column"))?;

    Ok(EmbeddingBlock {
        field,
        dimension,
        vectors,
    })
}

/// Attach title then transcript embeddings to the clean rows.
pub async fn build_index(
    embedder: &dyn TextEmbedder,
    records: Vec<CleanRecord>,
) -> Result<(IndexTable, EmbeddingStats)> {
    let mut table = IndexTable::new(records);

    for field in TextField::ALL {
        let block = embed_field(embedder, &table.records, field).await?;
        info!(
            %field,
            rows = block.vectors.len(),
            dimension = block.dimension,
            "Column embedded"
        );
        table.hconcat(block)?;
    }

    let stats = EmbeddingStats {
        rows: table.len() as u32,
        dimension: embedder.dimension(),
        columns_added: table.embedding_column_count(),
    };
    Ok((table, stats))
}

/// Read transformed `video-transcripts`, embed, write `video-index`.
pub async fn run(
    embedder: &dyn TextEmbedder,
    store: &dyn ArtifactStore,
) -> Result<EmbeddingStats> {
    let records = store.load_clean_transcripts()?;
    info!(rows = records.len(), "Generating embeddings");

    let (table, stats) = build_index(embedder, records).await?;
    store.save_index(&table)?;
    info!(
        rows = stats.rows,
        columns_added = stats.columns_added,
        "Video index saved"
    );
    Ok(stats)
}
