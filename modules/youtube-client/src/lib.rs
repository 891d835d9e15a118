pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::{SearchItem, SearchItemId, SearchPage, Snippet, VIDEO_KIND};

use types::ErrorEnvelope;

pub const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Results per search page. 50 is the Data API maximum.
pub const MAX_RESULTS: u32 = 50;

pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of a channel's search results, newest first.
    /// Pass the previous page's `nextPageToken` to continue; `None` starts from the top.
    pub async fn search_channel_page(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let url = format!("{}/search", self.base_url);
        let max_results = MAX_RESULTS.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("key", self.api_key.as_str()),
            ("channelId", channel_id),
            ("part", "snippet,id"),
            ("order", "date"),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        tracing::debug!(channel_id, page_token, "YouTube search request");

        let resp = self.client.get(&url).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let body = resp.text().await?;
        let page: SearchPage = serde_json::from_str(&body)?;
        tracing::debug!(
            items = page.items.len(),
            has_next = page.next_token().is_some(),
            "YouTube search page received"
        );

        Ok(page)
    }
}

/// Prefer the API's own `error.message`; fall back to the raw body.
fn api_error_message(body: String) -> String {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body,
    }
}
