use std::path::PathBuf;

use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;
use tracing::info;

/// Sentence-embedding model used for every run.
pub const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Output width of [`MODEL_NAME`].
pub const EMBEDDING_DIM: usize = 384;

// --- TextEmbedder trait ---

#[async_trait::async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed every text in one call. Returns one vector per input, in input order.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Width of every vector this embedder returns.
    fn dimension(&self) -> usize;
}

/// Local all-MiniLM-L6-v2 via fastembed (ONNX runtime).
///
/// The model is downloaded into `cache_dir` and loaded on the first batch, so a
/// run that fails in an earlier stage never pays for the model load.
pub struct LocalEmbedder {
    cache_dir: PathBuf,
    model: OnceCell<TextEmbedding>,
}

impl LocalEmbedder {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            model: OnceCell::new(),
        }
    }

    async fn model(&self) -> Result<&TextEmbedding> {
        self.model
            .get_or_try_init(|| async {
                info!(
                    model = MODEL_NAME,
                    cache_dir = %self.cache_dir.display(),
                    "Loading embedding model"
                );
                let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                    .with_cache_dir(self.cache_dir.clone())
                    .with_show_download_progress(false);
                TextEmbedding::try_new(options)
                    .with_context(|| format!("Failed to load embedding model {MODEL_NAME}"))
            })
            .await
    }
}

#[async_trait::async_trait]
impl TextEmbedder for LocalEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.model().await?;
        model
            .embed(texts, None)
            .with_context(|| format!("{MODEL_NAME} failed to encode batch"))
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}
