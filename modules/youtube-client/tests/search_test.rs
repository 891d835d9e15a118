//! Search client tests against a one-shot local HTTP stub.
//! No network access and no API key needed.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use youtube_client::{YouTubeClient, YouTubeError};

/// Serve a single canned response, returning the raw request head it received.
async fn stub_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });

    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn first_page_sends_channel_query_without_token() {
    let (base, server) = stub_once(
        "200 OK",
        r#"{"items": [{"id": {"kind": "youtube#video", "videoId": "v1"},
                       "snippet": {"publishedAt": "2024-01-10T15:00:06Z", "title": "One"}}],
            "nextPageToken": "NEXT"}"#,
    )
    .await;

    let client = YouTubeClient::new("test-key").with_base_url(base);
    let page = client.search_channel_page("UC123", None).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.next_token(), Some("NEXT"));

    let request = server.await.unwrap();
    let request_line = request.lines().next().unwrap();
    assert!(request_line.starts_with("GET /search?"), "{request_line}");
    assert!(request_line.contains("key=test-key"));
    assert!(request_line.contains("channelId=UC123"));
    assert!(request_line.contains("order=date"));
    assert!(request_line.contains("maxResults=50"));
    assert!(!request_line.contains("pageToken"));
}

#[tokio::test]
async fn continuation_token_is_forwarded() {
    let (base, server) = stub_once("200 OK", r#"{"items": []}"#).await;

    let client = YouTubeClient::new("k").with_base_url(base);
    let page = client.search_channel_page("UC123", Some("CDIQAA")).await.unwrap();
    assert!(page.next_token().is_none());

    let request = server.await.unwrap();
    assert!(request.lines().next().unwrap().contains("pageToken=CDIQAA"));
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let (base, _server) = stub_once(
        "403 Forbidden",
        r#"{"error": {"code": 403, "message": "The request cannot be completed because you have exceeded your quota."}}"#,
    )
    .await;

    let client = YouTubeClient::new("k").with_base_url(base);
    let err = client.search_channel_page("UC123", None).await.unwrap_err();

    match err {
        YouTubeError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("quota"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let (base, _server) = stub_once("200 OK", "not json").await;

    let client = YouTubeClient::new("k").with_base_url(base);
    let err = client.search_channel_page("UC123", None).await.unwrap_err();
    assert!(matches!(err, YouTubeError::Parse(_)));
}
