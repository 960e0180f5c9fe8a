//! Integration tests for the service document and package feeds.

mod helpers;

use axum::http::StatusCode;

use helpers::{TestApp, package};

/// The `<entry>` blocks of a feed body.
fn entries(xml: &str) -> Vec<&str> {
    xml.split("<entry>").skip(1).collect()
}

fn property<'a>(entry: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<d:{name}");
    let start = entry.find(&open)?;
    let rest = &entry[start..];
    let value_start = rest.find('>')? + 1;
    let value_end = rest.find(&format!("</d:{name}>"))?;
    Some(&rest[value_start..value_end])
}

#[tokio::test]
async fn test_service_document() {
    let app = TestApp::new().await;

    let response = app.get("/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        Some("application/xml;charset=utf-8")
    );
    let xml = response.text();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("https://feed.example.com/"));
    assert!(xml.contains("Packages"));
    assert!(xml.contains("Screenshots"));
}

#[tokio::test]
async fn test_metadata_document() {
    let app = TestApp::new().await;

    let response = app.get("/$metadata", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("V2FeedPackage"));
}

#[tokio::test]
async fn test_empty_feed() {
    let app = TestApp::new().await;

    let response = app.get("/Packages()", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        Some("application/atom+xml;type=feed;charset=utf-8")
    );
    assert_eq!(
        response.header("content-length"),
        Some(response.body.len().to_string().as_str())
    );
    assert!(entries(&response.text()).is_empty());
}

#[tokio::test]
async fn test_publish_list_and_download_scenario() {
    let app = TestApp::new().await;
    let filter = "/Packages()?$filter=tolower(Id)%20eq%20'sample.plugin'";

    // 1. First version is the only, and latest, entry.
    let response = app.push("/", &package("Sample.Plugin", "1.0.0"), None).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let xml = app.get(filter, None).await.text();
    let listed = entries(&xml);
    assert_eq!(listed.len(), 1);
    assert_eq!(property(listed[0], "IsLatestVersion"), Some("true"));

    // 2. A newer version takes over the latest flag.
    let response = app
        .push("/api/v2/package", &package("Sample.Plugin", "1.1.0"), None)
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let xml = app.get(filter, None).await.text();
    let listed = entries(&xml);
    assert_eq!(listed.len(), 2);
    let latest: Vec<&str> = listed
        .iter()
        .filter(|e| property(e, "IsLatestVersion") == Some("true"))
        .filter_map(|e| property(e, "Version"))
        .collect();
    assert_eq!(latest, vec!["1.1.0"]);

    // 3. Downloading 1.0.0 counts once for the version and once for the ID.
    let response = app.get("/nupkg/Sample.Plugin/1.0.0", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let old = app
        .get("/Packages(Id='Sample.Plugin',Version='1.0.0')", None)
        .await
        .text();
    assert_eq!(property(&old, "VersionDownloadCount"), Some("1"));
    assert_eq!(property(&old, "DownloadCount"), Some("1"));

    let new = app
        .get("/Packages(Id='Sample.Plugin',Version='1.1.0')", None)
        .await
        .text();
    assert_eq!(property(&new, "VersionDownloadCount"), Some("0"));
    assert_eq!(property(&new, "DownloadCount"), Some("1"));
}

#[tokio::test]
async fn test_single_entry_document() {
    let app = TestApp::new().await;
    app.push("/", &package("Sample.Plugin", "1.0.0"), None).await;

    let response = app
        .get("/Packages(Id='Sample.Plugin',Version='1.0.0')", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let xml = response.text();
    assert!(xml.contains("xml:base=\"https://feed.example.com/\""));
    assert!(xml.contains("https://feed.example.com/Packages(Id='Sample.Plugin',Version='1.0.0')"));
    assert!(xml.contains("<d:ReleaseNotes m:null=\"true\" />"));
    assert!(xml.contains("<d:Dependencies>Newtonsoft.Json:13.0.1:net6.0</d:Dependencies>"));
    assert!(!xml.contains("></"));
    assert!(!xml.contains("http://hosturl/"));
}

#[tokio::test]
async fn test_missing_entry_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .get("/Packages(Id='Nope',Version='1.0.0')", None)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unrecognised_filter_lists_everything() {
    let app = TestApp::new().await;
    app.push("/", &package("Alpha", "1.0.0"), None).await;
    app.push("/", &package("Beta", "1.0.0"), None).await;

    let response = app
        .get("/Packages()?$filter=startswith(Id,'Al')", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(entries(&response.text()).len(), 2);
}

#[tokio::test]
async fn test_find_packages_by_id() {
    let app = TestApp::new().await;
    app.push("/", &package("Alpha", "1.0.0"), None).await;
    app.push("/", &package("Alpha", "2.0.0"), None).await;
    app.push("/", &package("Beta", "1.0.0"), None).await;

    let response = app.get("/FindPackagesById()?id='alpha'", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let xml = response.text();
    let listed = entries(&xml);
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|e| property(e, "Id") == Some("Alpha")));
}

#[tokio::test]
async fn test_paging_with_top_and_skiptoken() {
    let app = TestApp::new().await;
    for id in ["A", "B", "C"] {
        app.push("/", &package(id, "1.0.0"), None).await;
    }

    let first = app.get("/Packages?$top=2", None).await.text();
    assert_eq!(entries(&first).len(), 2);
    assert!(first.contains("rel=\"next\""));
    assert!(first.contains("$skiptoken='B.1.0.0.nupkg'"));

    let second = app
        .get("/Packages?$top=2&$skiptoken='B.1.0.0.nupkg'", None)
        .await
        .text();
    let listed = entries(&second);
    assert_eq!(listed.len(), 1);
    assert_eq!(property(listed[0], "Id"), Some("C"));
    assert!(!second.contains("rel=\"next\""));
}

#[tokio::test]
async fn test_unknown_function_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/Search()", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reads_require_a_key_when_read_keys_exist() {
    let app = TestApp::with_keys(&["reader"], &["writer"]).await;

    let denied = app.get("/Packages()", None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert!(denied.body.is_empty());

    let denied = app.get("/Packages()", Some("stranger")).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    assert_eq!(app.get("/Packages()", Some("reader")).await.status, StatusCode::OK);
    assert_eq!(app.get("/Packages()", Some("writer")).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_needs_no_key() {
    let app = TestApp::with_keys(&["reader"], &["writer"]).await;

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "local");
}
