//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;

use feedhub_core::config::AppConfig;

/// Header carrying the API key in every test request.
pub const API_KEY_HEADER: &str = "X-NuGet-ApiKey";

const BOUNDARY: &str = "feedhub-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config
    pub config: AppConfig,
    /// Package root, removed when the app is dropped
    pub root: TempDir,
}

impl TestApp {
    /// An open feed on a fresh local package tree.
    pub async fn new() -> Self {
        Self::with_keys(&[], &[]).await
    }

    /// A feed restricted by the given key lists.
    pub async fn with_keys(read_only: &[&str], read_write: &[&str]) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = AppConfig::default();
        config.server.host_url = "https://feed.example.com/".to_string();
        config.storage.local.root_path = root.path().to_string_lossy().to_string();
        config.auth.read_only = read_only.iter().map(|k| k.to_string()).collect();
        config.auth.read_write = read_write.iter().map(|k| k.to_string()).collect();

        let backend = feedhub_storage::build_backend(&config)
            .await
            .expect("Failed to init storage");
        let state = feedhub_api::AppState::new(config.clone(), backend);
        let router = feedhub_api::build_router(state);

        Self {
            router,
            config,
            root,
        }
    }

    /// GET `path`, optionally presenting an API key.
    pub async fn get(&self, path: &str, key: Option<&str>) -> TestResponse {
        let mut req = Request::builder().method("GET").uri(path);
        if let Some(key) = key {
            req = req.header(API_KEY_HEADER, key);
        }
        self.send(req.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    /// PUT an archive as a single multipart part.
    pub async fn push(&self, path: &str, archive: &[u8], key: Option<&str>) -> TestResponse {
        self.push_parts(path, &[archive], key).await
    }

    /// PUT several multipart parts in order.
    pub async fn push_parts(&self, path: &str, parts: &[&[u8]], key: Option<&str>) -> TestResponse {
        let mut req = Request::builder()
            .method("PUT")
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(key) = key {
            req = req.header(API_KEY_HEADER, key);
        }
        let req = req
            .body(Body::from(multipart_body(parts)))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// PUT a raw body with an arbitrary content type.
    pub async fn put_raw(&self, path: &str, content_type: &str, body: &[u8]) -> TestResponse {
        let req = Request::builder()
            .method("PUT")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_vec()))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A nuspec manifest for `id` at `version`.
pub fn nuspec(id: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <title>{id}</title>
    <authors>FeedHub Tests</authors>
    <description>Package used by integration tests</description>
    <tags>sample plugin</tags>
    <releaseNotes></releaseNotes>
    <dependencies>
      <group targetFramework="net6.0">
        <dependency id="Newtonsoft.Json" version="13.0.1" />
      </group>
    </dependencies>
  </metadata>
</package>"#
    )
}

/// A package archive: manifest plus one content file.
pub fn package(id: &str, version: &str) -> Vec<u8> {
    let spec = nuspec(id, version);
    build_zip(&[
        (&format!("{id}.nuspec"), spec.as_bytes()),
        ("content/ReadMe.txt", b"Read me first"),
    ])
}

/// Build an in-memory zip from `(path, contents)` pairs.
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer.write_all(data).expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip")
        .into_inner()
}

fn multipart_body(parts: &[&[u8]]) -> Vec<u8> {
    let mut body = Vec::new();
    for (index, part) in parts.iter().enumerate() {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"package{index}\"; filename=\"package.nupkg\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(part);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
