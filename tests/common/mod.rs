//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own temporary database,
//! listening on an ephemeral port.

#![allow(dead_code)] // Not every test file uses every helper.

use rhythm_library_server::library_store::SqliteLibraryStore;
use rhythm_library_server::server::{make_app, ServerConfig};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    // Keeps the database directory alive for the duration of the test.
    _temp_db_dir: TempDir,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(
            SqliteLibraryStore::new(temp_db_dir.path().join("library.db"), 2)
                .expect("open test store"),
        );

        let app = make_app(ServerConfig::default(), store);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        TestServer {
            base_url: format!("http://{}", addr),
            _temp_db_dir: temp_db_dir,
        }
    }
}

pub async fn create_folder(client: &reqwest::Client, base_url: &str, number: i64, title: &str) {
    let response = client
        .post(format!("{}/folders", base_url))
        .json(&serde_json::json!({"number": number, "title": title}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
}

pub async fn create_song(
    client: &reqwest::Client,
    base_url: &str,
    body: serde_json::Value,
) -> i64 {
    let response = client
        .post(format!("{}/songs", base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let parsed: serde_json::Value = response.json().await.unwrap();
    parsed["id"].as_i64().unwrap()
}
