use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use vidpost_api_client::ApiClient;
use vidpost_core::IngestError;
use vidpost_worker::{IngestOutcome, IngestState, IngestionWorkflow, ProcessSupervisor};

const TOKEN: &str = "flic_test_token";
const CLIP: &str = "0123456789abcdef";

fn workflow_for(server: &ServerGuard) -> IngestionWorkflow {
    let client = ApiClient::new(server.url(), TOKEN.to_string(), None).unwrap();
    IngestionWorkflow::new(Arc::new(client))
}

async fn mock_destination(server: &mut ServerGuard) -> Mock {
    let body = json!({"url": format!("{}/x", server.url()), "hash": "abc123"}).to_string();
    server
        .mock("GET", "/posts/generate-upload-url")
        .match_header("flic-token", TOKEN)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_post(server: &mut ServerGuard, title: &str, expect: usize) -> Mock {
    server
        .mock("POST", "/posts")
        .match_header("flic-token", TOKEN)
        .match_body(Matcher::Json(json!({
            "title": title,
            "hash": "abc123",
            "is_available_in_public_feed": false,
            "category_id": 1
        })))
        .with_status(201)
        .with_body(r#"{"id":"post-1"}"#)
        .expect(expect)
        .create_async()
        .await
}

#[tokio::test]
async fn test_clip_is_uploaded_posted_and_removed() {
    let mut server = mockito::Server::new_async().await;
    let destination = mock_destination(&mut server).await;
    let upload = server
        .mock("PUT", "/x")
        .match_body(CLIP)
        .with_status(200)
        .create_async()
        .await;
    let post = mock_post(&mut server, "clip.mp4", 1).await;

    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, CLIP).unwrap();

    let outcome = workflow_for(&server).run(path.clone()).await;

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(!path.exists());
    destination.assert_async().await;
    upload.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn test_failed_upload_sends_no_post_and_keeps_clip() {
    let mut server = mockito::Server::new_async().await;
    let destination = mock_destination(&mut server).await;
    let upload = server
        .mock("PUT", "/x")
        .with_status(500)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/posts")
        .expect(0)
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, CLIP).unwrap();

    let outcome = workflow_for(&server).run(path.clone()).await;

    assert!(path.exists());
    match outcome {
        IngestOutcome::Failed {
            failed_in, error, ..
        } => {
            assert_eq!(failed_in, IngestState::DestinationRequested);
            assert!(matches!(error, IngestError::UploadTransfer { .. }));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    destination.assert_async().await;
    upload.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn test_clip_growing_during_upload_is_kept_and_not_posted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, CLIP).unwrap();

    let mut server = mockito::Server::new_async().await;
    let destination = mock_destination(&mut server).await;
    // The writer is still copying the clip in while the PUT is being served.
    let writer_path = path.clone();
    let upload = server
        .mock("PUT", "/x")
        .match_header("content-length", "16")
        .match_body(CLIP)
        .with_status(200)
        .with_body_from_request(move |_| {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&writer_path)
                .unwrap();
            file.write_all(&[7u8; 8192]).unwrap();
            "".into()
        })
        .create_async()
        .await;
    let post = server
        .mock("POST", "/posts")
        .expect(0)
        .create_async()
        .await;

    let outcome = workflow_for(&server).run(path.clone()).await;

    match outcome {
        IngestOutcome::Failed {
            failed_in, error, ..
        } => {
            assert_eq!(failed_in, IngestState::DestinationRequested);
            assert!(matches!(error, IngestError::UploadTransfer { .. }));
            assert!(error.to_string().contains("changed during upload"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 16 + 8192);
    destination.assert_async().await;
    upload.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn test_destination_failure_keeps_clip() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/posts/generate-upload-url")
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;
    let upload = server.mock("PUT", "/x").expect(0).create_async().await;

    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, CLIP).unwrap();

    let outcome = workflow_for(&server).run(path.clone()).await;

    assert!(!outcome.is_success());
    assert!(path.exists());
    upload.assert_async().await;
}

#[tokio::test]
async fn test_post_failure_keeps_clip() {
    let mut server = mockito::Server::new_async().await;
    mock_destination(&mut server).await;
    server
        .mock("PUT", "/x")
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("POST", "/posts")
        .with_status(400)
        .with_body(r#"{"error":"bad category"}"#)
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, CLIP).unwrap();

    let outcome = workflow_for(&server).run(path.clone()).await;

    assert!(path.exists());
    match outcome {
        IngestOutcome::Failed { error, .. } => {
            assert_eq!(error.http_status(), Some(400));
            assert!(error.leaves_orphaned_upload());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_watched_directory_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    mock_destination(&mut server).await;
    server
        .mock("PUT", "/x")
        .with_status(200)
        .create_async()
        .await;
    let post = mock_post(&mut server, "clip.mp4", 1).await;

    let dir = tempdir().unwrap();
    let videos = dir.path().join("videos");
    let running = ProcessSupervisor::new(&videos, workflow_for(&server))
        .start()
        .unwrap();
    assert!(videos.is_dir());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(running.run_until(async {
        let _ = stop_rx.await;
    }));

    std::fs::write(videos.join("readme.txt"), b"not a video").unwrap();
    let clip = videos.join("clip.mp4");
    std::fs::write(&clip, CLIP).unwrap();

    let mut removed = false;
    for _ in 0..200 {
        if !clip.exists() {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(removed, "clip.mp4 was not ingested");
    tokio::time::sleep(Duration::from_millis(200)).await;

    stop_tx.send(()).unwrap();
    let stats = handle.await.unwrap();

    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.completed, 1);
    assert!(videos.join("readme.txt").exists());
    post.assert_async().await;
}
