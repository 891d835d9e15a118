use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;

use crate::embedder::TextEmbedder;
use crate::stages::{
    self, EmbeddingStats, ListingStats, SpecialStrings, TranscriptStats, TransformStats,
};
use crate::store::ArtifactStore;
use crate::traits::{TranscriptSource, VideoSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ListVideos,
    FetchTranscripts,
    Transform,
    Embed,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::ListVideos,
        Stage::FetchTranscripts,
        Stage::Transform,
        Stage::Embed,
    ];

    pub fn number(&self) -> u8 {
        match self {
            Stage::ListVideos => 1,
            Stage::FetchTranscripts => 2,
            Stage::Transform => 3,
            Stage::Embed => 4,
        }
    }

    fn completed(&self) -> &'static str {
        match self {
            Stage::ListVideos => "Video IDs downloaded",
            Stage::FetchTranscripts => "Transcripts downloaded",
            Stage::Transform => "Data transformed",
            Stage::Embed => "Embeddings generated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

/// Stats from a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub listing: ListingStats,
    pub transcripts: TranscriptStats,
    pub transform: TransformStats,
    pub embeddings: EmbeddingStats,
    pub timings: Vec<StageTiming>,
}

impl PipelineStats {
    pub fn total_elapsed(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Pipeline Run Complete ===")?;
        writeln!(f, "Search pages:        {}", self.listing.pages)?;
        writeln!(f, "Videos listed:       {}", self.listing.videos)?;
        writeln!(f, "Non-video hits:      {}", self.listing.skipped_non_video)?;
        writeln!(f, "Duplicate hits:      {}", self.listing.skipped_duplicate)?;
        writeln!(f, "Transcripts fetched: {}", self.transcripts.fetched)?;
        writeln!(f, "Transcripts missing: {}", self.transcripts.missing)?;
        writeln!(f, "Rows transformed:    {}", self.transform.rows)?;
        writeln!(f, "Unparsed dates:      {}", self.transform.unparsed_timestamps)?;
        writeln!(f, "Rows indexed:        {}", self.embeddings.rows)?;
        writeln!(
            f,
            "Embedding columns:   {} ({} x {})",
            self.embeddings.columns_added,
            self.embeddings.columns_added / self.embeddings.dimension.max(1),
            self.embeddings.dimension
        )?;
        writeln!(f, "\nTimings:")?;
        for t in &self.timings {
            writeln!(
                f,
                "  Step {}: {:.2}s ({})",
                t.stage.number(),
                t.elapsed.as_secs_f64(),
                t.stage.completed()
            )?;
        }
        writeln!(f, "  Total:  {:.2}s", self.total_elapsed().as_secs_f64())?;
        Ok(())
    }
}

/// The four stages wired to their collaborators. Each stage reads the previous
/// stage's artifact from `store`, so a failure leaves earlier artifacts in place.
pub struct Pipeline<'a> {
    channel_id: String,
    store: &'a dyn ArtifactStore,
    search: &'a dyn VideoSearch,
    transcripts: &'a dyn TranscriptSource,
    embedder: &'a dyn TextEmbedder,
    rules: SpecialStrings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        channel_id: impl Into<String>,
        store: &'a dyn ArtifactStore,
        search: &'a dyn VideoSearch,
        transcripts: &'a dyn TranscriptSource,
        embedder: &'a dyn TextEmbedder,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            store,
            search,
            transcripts,
            embedder,
            rules: SpecialStrings::default(),
        }
    }

    pub fn with_rules(mut self, rules: SpecialStrings) -> Self {
        self.rules = rules;
        self
    }

    /// Run all four stages in order. The first stage error aborts the run.
    pub async fn run(&self) -> Result<PipelineStats> {
        let mut stats = PipelineStats::default();

        let t0 = Instant::now();
        stats.listing = stages::lister::run(self.search, &self.channel_id, self.store).await?;
        stats.timings.push(finish(Stage::ListVideos, t0));

        let t0 = Instant::now();
        stats.transcripts = stages::transcripts::run(self.transcripts, self.store).await?;
        stats.timings.push(finish(Stage::FetchTranscripts, t0));

        let t0 = Instant::now();
        stats.transform = stages::transform::run(self.store, &self.rules)?;
        stats.timings.push(finish(Stage::Transform, t0));

        let t0 = Instant::now();
        stats.embeddings = stages::embeddings::run(self.embedder, self.store).await?;
        stats.timings.push(finish(Stage::Embed, t0));

        Ok(stats)
    }
}

fn finish(stage: Stage, started: Instant) -> StageTiming {
    let elapsed = started.elapsed();
    info!("Step {}: Done", stage.number());
    info!(
        step = stage.number(),
        elapsed_secs = elapsed.as_secs_f64(),
        "---> {} in {:.3} seconds",
        stage.completed(),
        elapsed.as_secs_f64()
    );
    StageTiming { stage, elapsed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_numbered_in_order() {
        let numbers: Vec<u8> = Stage::ALL.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn summary_lists_every_timing() {
        let stats = PipelineStats {
            embeddings: EmbeddingStats {
                rows: 3,
                dimension: 8,
                columns_added: 16,
            },
            timings: Stage::ALL
                .iter()
                .map(|&stage| StageTiming {
                    stage,
                    elapsed: Duration::from_millis(250),
                })
                .collect(),
            ..Default::default()
        };

        let summary = stats.to_string();
        assert!(summary.contains("Embedding columns:   16 (2 x 8)"));
        assert!(summary.contains("Step 4: 0.25s (Embeddings generated)"));
        assert!(summary.contains("Total:  1.00s"));
    }
}
