use thiserror::Error;

pub type Result<T> = std::result::Result<T, YouTubeError>;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        YouTubeError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for YouTubeError {
    fn from(err: serde_json::Error) -> Self {
        YouTubeError::Parse(err.to_string())
    }
}
