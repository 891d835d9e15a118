use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoIndexError {
    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Embedding shape error: {0}")]
    EmbeddingShape(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
