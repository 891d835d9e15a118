//! Transcript fetching: joined text, sentinel on failure, row order.

use videoindex_common::{VideoRecord, TRANSCRIPT_SENTINEL};
use videoindex_pipeline::stages::transcripts::{self, fetch_transcripts};
use videoindex_pipeline::store::{ArtifactStore, MemoryStore};
use videoindex_pipeline::testing::MockTranscripts;
use videoindex_pipeline::traits::TranscriptError;

fn video(id: &str) -> VideoRecord {
    VideoRecord {
        video_id: id.to_string(),
        published_at: "2024-01-10T15:00:06Z".to_string(),
        title: format!("Title {id}"),
    }
}

#[tokio::test]
async fn caption_lines_joined_with_spaces() {
    let source = MockTranscripts::new().on_video("v1", &["hello", "world"]);

    let (rows, stats) = fetch_transcripts(&source, vec![video("v1")]).await;

    assert_eq!(rows[0].transcript, "hello world");
    assert_eq!(stats.fetched, 1);
    assert_eq!(stats.missing, 0);
}

#[tokio::test]
async fn failures_get_the_sentinel_and_the_batch_continues() {
    let source = MockTranscripts::new()
        .on_video("v1", &["first"])
        .on_error(
            "v2",
            TranscriptError::Request {
                video_id: "v2".into(),
                reason: "connection reset".into(),
            },
        )
        .on_video("v4", &["last"]);

    // v3 is unregistered: captions disabled.
    let (rows, stats) = fetch_transcripts(
        &source,
        vec![video("v1"), video("v2"), video("v3"), video("v4")],
    )
    .await;

    let transcripts: Vec<&str> = rows.iter().map(|r| r.transcript.as_str()).collect();
    assert_eq!(transcripts, vec!["first", TRANSCRIPT_SENTINEL, TRANSCRIPT_SENTINEL, "last"]);
    assert_eq!(stats.videos, 4);
    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.missing, 2);
    assert!(!rows[1].has_transcript());
}

#[tokio::test]
async fn rows_keep_input_order_and_identity_fields() {
    let source = MockTranscripts::new()
        .on_video("c", &["three"])
        .on_video("a", &["one"])
        .on_video("b", &["two"]);
    let input = vec![video("c"), video("a"), video("b")];

    let (rows, _) = fetch_transcripts(&source, input.clone()).await;

    assert_eq!(source.calls(), vec!["c", "a", "b"]);
    for (row, video) in rows.iter().zip(&input) {
        assert_eq!(row.video_id, video.video_id);
        assert_eq!(row.published_at, video.published_at);
        assert_eq!(row.title, video.title);
    }
}

#[tokio::test]
async fn empty_caption_list_is_empty_text_not_sentinel() {
    let source = MockTranscripts::new().on_video("v1", &[]);
    let (rows, stats) = fetch_transcripts(&source, vec![video("v1")]).await;
    assert_eq!(rows[0].transcript, "");
    assert_eq!(stats.fetched, 1);
}

#[tokio::test]
async fn run_reads_video_ids_and_writes_transcripts() {
    let store = MemoryStore::new().with_videos(vec![video("v1"), video("v2")]);
    let source = MockTranscripts::new().on_video("v1", &["a", "b"]);

    let stats = transcripts::run(&source, &store).await.unwrap();

    assert_eq!(stats.fetched, 1);
    let saved = store.load_transcripts().unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].transcript, "a b");
    assert_eq!(saved[1].transcript, "n/a");
}

#[tokio::test]
async fn run_without_video_ids_fails() {
    let store = MemoryStore::new();
    let source = MockTranscripts::new();
    assert!(transcripts::run(&source, &store).await.is_err());
    assert!(source.calls().is_empty());
}
