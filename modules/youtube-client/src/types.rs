use serde::Deserialize;

/// `id.kind` value the search endpoint uses for video hits.
pub const VIDEO_KIND: &str = "youtube#video";

/// One page of `GET /search` results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

impl SearchPage {
    /// The continuation token, treating an empty string the same as an absent one.
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// A single search hit. The endpoint mixes videos, channels and playlists.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
    pub snippet: Option<Snippet>,
}

impl SearchItem {
    pub fn is_video(&self) -> bool {
        self.id.kind == VIDEO_KIND
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItemId {
    pub kind: String,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(rename = "playlistId")]
    pub playlist_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snippet {
    /// RFC 3339 text as returned by the API, e.g. `2024-01-10T15:00:06Z`.
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub title: String,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

/// Error envelope the Data API returns alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_page() {
        let page: SearchPage = serde_json::from_str(
            r#"{
                "kind": "youtube#searchListResponse",
                "nextPageToken": "CDIQAA",
                "items": [
                    {
                        "id": {"kind": "youtube#video", "videoId": "abc123"},
                        "snippet": {"publishedAt": "2024-01-10T15:00:06Z", "title": "First"}
                    },
                    {
                        "id": {"kind": "youtube#channel", "channelId": "UCxyz"},
                        "snippet": {"publishedAt": "2020-01-01T00:00:00Z", "title": "Channel"}
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].is_video());
        assert!(!page.items[1].is_video());
        assert_eq!(page.items[0].id.video_id.as_deref(), Some("abc123"));
        assert_eq!(page.next_token(), Some("CDIQAA"));
    }

    #[test]
    fn last_page_has_no_token() {
        let page: SearchPage = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(page.next_token().is_none());
    }

    #[test]
    fn empty_token_is_no_token() {
        let page: SearchPage =
            serde_json::from_str(r#"{"items": [], "nextPageToken": ""}"#).unwrap();
        assert!(page.next_token().is_none());
    }

    #[test]
    fn missing_items_defaults_to_empty() {
        let page: SearchPage = serde_json::from_str(r#"{"kind": "x"}"#).unwrap();
        assert!(page.items.is_empty());
    }
}
