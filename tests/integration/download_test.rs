//! Integration tests for package downloads and extracted files.

mod helpers;

use axum::http::StatusCode;

use helpers::{TestApp, package};

#[tokio::test]
async fn test_download_headers_and_bytes() {
    let app = TestApp::new().await;
    let archive = package("Sample.Plugin", "1.0.0");
    app.push("/", &archive, None).await;

    let response = app.get("/nupkg/Sample.Plugin/1.0.0", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("cache-control"), Some("max-age=3600"));
    assert_eq!(
        response.header("content-disposition"),
        Some("filename=Sample.Plugin.1.0.0.nupkg")
    );
    assert_eq!(response.header("content-type"), Some("binary/octet-stream"));
    assert_eq!(response.body.as_ref(), archive.as_slice());
}

#[tokio::test]
async fn test_download_via_media_link() {
    let app = TestApp::new().await;
    let archive = package("Sample.Plugin", "1.0.0");
    app.push("/", &archive, None).await;

    let response = app
        .get("/Packages(Id='Sample.Plugin',Version='1.0.0')/$value", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), archive.as_slice());
}

#[tokio::test]
async fn test_download_missing_package() {
    let app = TestApp::new().await;

    let response = app.get("/nupkg/Nope/1.0.0", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_rejects_path_like_segments() {
    let app = TestApp::new().await;
    app.push("/", &package("Sample.Plugin", "1.0.0"), None).await;

    for path in [
        "/nupkg/..%2F..%2Fetc/passwd",
        "/nupkg/sample.plugin%2F1.0.0%2F../1.0.0",
        "/nupkg/Sample.Plugin/..%2F1.0.0",
    ] {
        let response = app.get(path, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_download_requires_read_key() {
    let app = TestApp::with_keys(&["reader"], &[]).await;

    let response = app.get("/nupkg/Sample.Plugin/1.0.0", None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.get("/nupkg/Sample.Plugin/1.0.0", Some("reader")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_extracted_file_is_served() {
    let app = TestApp::new().await;
    app.push("/", &package("Sample.Plugin", "1.0.0"), None).await;

    let response = app
        .get("/files/Sample.Plugin/1.0.0/content/ReadMe.txt", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "Read me first");
    assert_eq!(response.header("content-type"), Some("text/plain"));
}

#[tokio::test]
async fn test_extracted_file_falls_back_to_lowercase_name() {
    let app = TestApp::new().await;
    let spec = helpers::nuspec("Docs", "1.0.0");
    let archive = helpers::build_zip(&[
        ("Docs.nuspec", spec.as_bytes()),
        ("content/readme.md", b"# Docs"),
    ]);
    app.push("/", &archive, None).await;

    let response = app.get("/files/Docs/1.0.0/content/README.md", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "# Docs");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/files/Nope/1.0.0/readme.txt", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
