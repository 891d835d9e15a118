use std::env;
use std::path::PathBuf;

/// Channel indexed when `YT_CHANNEL_ID` is not set.
pub const DEFAULT_CHANNEL_ID: &str = "UCa9gErQ9AE5jT2DZLjXBIdA";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // YouTube Data API
    pub youtube_api_key: String,
    pub youtube_base_url: Option<String>,
    pub channel_id: String,

    // Artifacts
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    /// The API key is not validated here; an empty key fails at the search call.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let config = Self {
            youtube_api_key: env::var("YT_API_KEY").unwrap_or_default(),
            youtube_base_url: env::var("YT_API_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            channel_id: env::var("YT_CHANNEL_ID")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string()),
            data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())),
        };

        config.log_keys();
        config
    }

    /// Config for tests and embedding callers: explicit values, nothing read from env.
    pub fn new(
        youtube_api_key: impl Into<String>,
        channel_id: impl Into<String>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            youtube_api_key: youtube_api_key.into(),
            youtube_base_url: None,
            channel_id: channel_id.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  YT_API_KEY: {}", preview(&self.youtube_api_key));
        tracing::info!(
            "  YT_API_BASE_URL: {}",
            self.youtube_base_url.as_deref().unwrap_or("<default>")
        );
        tracing::info!("  YT_CHANNEL_ID: {}", self.channel_id);
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
    }
}

fn preview(val: &str) -> String {
    if val.is_empty() {
        return "<not set>".to_string();
    }
    let n = val
        .char_indices()
        .nth(5)
        .map(|(i, _)| i)
        .unwrap_or(val.len());
    format!("{}...({} chars)", &val[..n], val.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_redacts_key() {
        assert_eq!(preview("AIzaSyExampleKey"), "AIzaS...(16 chars)");
    }

    #[test]
    fn preview_empty_key() {
        assert_eq!(preview(""), "<not set>");
    }

    #[test]
    fn preview_short_key() {
        assert_eq!(preview("abc"), "abc...(3 chars)");
    }

    #[test]
    fn explicit_config_has_no_base_override() {
        let config = Config::new("k", "UC1", "/tmp/out");
        assert!(config.youtube_base_url.is_none());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/out"));
    }
}
