//! Integration tests for package pushes.

mod helpers;

use axum::http::StatusCode;

use helpers::{TestApp, build_zip, nuspec, package};

#[tokio::test]
async fn test_push_creates_package() {
    let app = TestApp::new().await;

    let response = app.push("/", &package("Sample.Plugin", "1.0.0"), None).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(
        app.root
            .path()
            .join("sample.plugin/1.0.0/sample.plugin.1.0.0.nupkg")
            .exists()
    );
}

#[tokio::test]
async fn test_duplicate_push_conflicts() {
    let app = TestApp::new().await;
    let archive = package("Sample.Plugin", "1.0.0");

    assert_eq!(app.push("/", &archive, None).await.status, StatusCode::CREATED);
    assert_eq!(
        app.push("/api/v2/package/", &archive, None).await.status,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn test_unreadable_archive_is_unsupported() {
    let app = TestApp::new().await;

    let response = app.push("/", b"this is not a zip archive", None).await;

    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_archive_without_manifest_is_unsupported() {
    let app = TestApp::new().await;
    let archive = build_zip(&[("content/readme.txt", b"no manifest here")]);

    let response = app.push("/", &archive, None).await;

    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_path_like_package_id_is_unsupported() {
    let app = TestApp::new().await;
    let spec = nuspec("../escaped", "1.0.0");
    let archive = build_zip(&[
        ("evil.nuspec", spec.as_bytes()),
        ("content/ReadMe.TXT", b"outside"),
    ]);

    let response = app.push("/", &archive, None).await;

    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let written = std::fs::read_dir(app.root.path())
        .expect("Failed to list root")
        .count();
    assert_eq!(written, 0);
}

#[tokio::test]
async fn test_empty_push_has_no_content() {
    let app = TestApp::new().await;

    let response = app.push("/", b"", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.put_raw("/", "application/octet-stream", b"").await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_last_multipart_part_wins() {
    let app = TestApp::new().await;
    let first = package("First", "1.0.0");
    let second = package("Second", "1.0.0");

    let response = app.push_parts("/", &[&first, &second], None).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let listed = app.get("/Packages()", None).await.text();
    assert!(listed.contains("<d:Id>Second</d:Id>"));
    assert!(!listed.contains("<d:Id>First</d:Id>"));
}

#[tokio::test]
async fn test_push_requires_write_key() {
    let app = TestApp::with_keys(&["reader"], &["writer"]).await;
    let archive = package("Sample.Plugin", "1.0.0");

    let response = app.push("/", &archive, None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.is_empty());

    let response = app.push("/", &archive, Some("reader")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.push("/", &archive, Some("writer")).await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_public_read_feed_still_guards_pushes() {
    let app = TestApp::with_keys(&[], &["writer"]).await;
    let spec = nuspec("Guarded", "1.0.0");
    let archive = build_zip(&[("Guarded.nuspec", spec.as_bytes())]);

    assert_eq!(app.get("/Packages()", None).await.status, StatusCode::OK);
    assert_eq!(
        app.push("/", &archive, Some("someone")).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.push("/", &archive, Some("writer")).await.status,
        StatusCode::CREATED
    );
}

#[tokio::test]
async fn test_refresh_requires_write_and_reindexes() {
    let app = TestApp::with_keys(&["reader"], &["writer"]).await;
    app.push("/", &package("Sample.Plugin", "1.0.0"), Some("writer"))
        .await;

    assert_eq!(
        app.get("/Refresh", Some("reader")).await.status,
        StatusCode::FORBIDDEN
    );

    let response = app.get("/Refresh", Some("writer")).await;
    assert_eq!(response.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["packages"], 1);
}
