//! Stage 1: enumerate a channel's videos by walking search result pages.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use videoindex_common::VideoRecord;
use youtube_client::SearchItem;

use crate::store::ArtifactStore;
use crate::traits::VideoSearch;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListingStats {
    pub pages: u32,
    pub videos: u32,
    pub skipped_non_video: u32,
    pub skipped_missing_id: u32,
    pub skipped_duplicate: u32,
}

/// Convert a search hit to a record. `None` for channel/playlist hits and
/// for video hits with no usable id.
pub fn video_record(item: &SearchItem) -> Option<VideoRecord> {
    if !item.is_video() {
        return None;
    }
    let video_id = item.id.video_id.as_deref().filter(|id| !id.is_empty())?;
    let snippet = item.snippet.as_ref()?;
    Some(VideoRecord {
        video_id: video_id.to_string(),
        published_at: snippet.published_at.clone(),
        title: snippet.title.clone(),
    })
}

/// Walk every page of the channel's search results.
///
/// Stops when a page carries no continuation token, or when the API hands back a
/// token already requested in this walk. Any request error aborts the listing.
pub async fn list_videos(
    search: &dyn VideoSearch,
    channel_id: &str,
) -> Result<(Vec<VideoRecord>, ListingStats)> {
    let mut stats = ListingStats::default();
    let mut videos = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut seen_tokens = HashSet::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = search
            .search_page(channel_id, page_token.as_deref())
            .await
            .with_context(|| format!("Search failed for channel {channel_id}"))?;
        stats.pages += 1;
        debug!(page = stats.pages, items = page.items.len(), "Search page");

        for item in &page.items {
            if !item.is_video() {
                stats.skipped_non_video += 1;
                continue;
            }
            let Some(record) = video_record(item) else {
                warn!(kind = %item.id.kind, "Video hit without an id or snippet, skipping");
                stats.skipped_missing_id += 1;
                continue;
            };
            if !seen_ids.insert(record.video_id.clone()) {
                debug!(video_id = %record.video_id, "Duplicate video hit, skipping");
                stats.skipped_duplicate += 1;
                continue;
            }
            videos.push(record);
        }

        let Some(next) = page.next_token() else {
            break;
        };
        if !seen_tokens.insert(next.to_string()) {
            warn!(token = next, "Search returned a page token it already served, stopping");
            break;
        }
        page_token = Some(next.to_string());
    }

    stats.videos = videos.len() as u32;
    Ok((videos, stats))
}

/// List the channel and overwrite the `video-ids` artifact.
pub async fn run(
    search: &dyn VideoSearch,
    channel_id: &str,
    store: &dyn ArtifactStore,
) -> Result<ListingStats> {
    info!(channel_id, "Listing channel videos");
    let (videos, stats) = list_videos(search, channel_id).await?;
    store.save_videos(&videos)?;
    info!(
        pages = stats.pages,
        videos = stats.videos,
        skipped_non_video = stats.skipped_non_video,
        "Video IDs saved"
    );
    Ok(stats)
}
