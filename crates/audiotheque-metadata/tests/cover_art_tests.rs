// SPDX-License-Identifier: GPL-3.0-or-later
use audiotheque_domain::ArtworkMime;
use audiotheque_metadata::{CoverArtClient, CoverArtError};
use std::time::Duration;
use wiremock::matchers::{headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RELEASE_ID: &str = "b1392450-e666-3926-a536-22c65f834433";
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn client_for(server: &MockServer, dir: &std::path::Path) -> CoverArtClient {
    CoverArtClient::new(Some(server.uri()), Duration::from_secs(5), "audiotheque-tests")
        .unwrap()
        .with_temp_dir(dir)
}

#[tokio::test]
async fn test_fetch_front_cover_writes_png_temp_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/release/{}/front", RELEASE_ID)))
        .and(headers("accept", vec!["image/jpeg", "image/png"]))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(PNG_MAGIC.to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, dir.path());
    let artwork = client.fetch_front_cover(RELEASE_ID).await.unwrap().unwrap();

    assert_eq!(artwork.mime(), ArtworkMime::Png);
    assert!(artwork.path().starts_with(dir.path()));
    assert!(artwork.path().to_string_lossy().ends_with(".png"));
    assert_eq!(artwork.read_bytes().unwrap(), PNG_MAGIC);

    let path = artwork.path().to_path_buf();
    artwork.release();
    assert!(!path.exists());
}

#[tokio::test]
async fn test_unknown_content_type_defaults_to_jpeg() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/release/{}/front", RELEASE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;

    let client = client_for(&server, dir.path());
    let artwork = client.fetch_front_cover(RELEASE_ID).await.unwrap().unwrap();

    assert_eq!(artwork.mime(), ArtworkMime::Jpeg);
    assert!(artwork.path().to_string_lossy().ends_with(".jpg"));
}

#[tokio::test]
async fn test_missing_cover_is_none() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server, dir.path());
    assert!(client.fetch_front_cover(RELEASE_ID).await.unwrap().is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client_for(&server, dir.path());
    let result = client.fetch_front_cover(RELEASE_ID).await;
    assert!(matches!(result, Err(CoverArtError::HttpStatus { .. })));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_MAGIC.to_vec())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = CoverArtClient::new(Some(server.uri()), Duration::from_millis(200), "audiotheque-tests")
        .unwrap()
        .with_temp_dir(dir.path());
    let result = client.fetch_front_cover(RELEASE_ID).await;
    assert!(matches!(result, Err(CoverArtError::Http(_))));
}

#[tokio::test]
async fn test_cached_cover_gets_fresh_temp_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/release/{}/front", RELEASE_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, dir.path());
    let first = client.fetch_front_cover(RELEASE_ID).await.unwrap().unwrap();
    let second = client.fetch_front_cover(RELEASE_ID).await.unwrap().unwrap();

    assert_ne!(first.path(), second.path());
    first.release();
    assert!(second.path().exists());
}

#[tokio::test]
async fn test_blank_release_id_makes_no_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, dir.path());
    assert!(client.fetch_front_cover("  ").await.unwrap().is_none());
}
