//! Common test infrastructure
//!
//! Spawns an isolated server per test, with its own database file and uploads
//! directory, on a random port.

use movielib_server::audio_reviews::AudioReviewStore;
use movielib_server::catalog_search::CatalogSearchClient;
use movielib_server::library_store::SqliteLibraryStore;
use movielib_server::server::server::make_app;
use movielib_server::server::{RequestsLoggingLevel, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

const SERVER_READY_TIMEOUT_MS: u64 = 5000;
const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Test server instance with an isolated database and uploads directory.
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Root of the uploads directory, for asserting on stored files.
    pub uploads_path: PathBuf,

    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("library.db");
        let uploads_path = temp_dir.path().join("uploads");

        let library =
            Arc::new(SqliteLibraryStore::new(&db_path).expect("Failed to open library store"));
        let audio_reviews = Arc::new(AudioReviewStore::new(&uploads_path));

        // Unroutable upstream; catalog search is not exercised over the wire
        // in these tests.
        let search_client = Arc::new(
            CatalogSearchClient::new("http://127.0.0.1:1".to_string(), 1)
                .expect("Failed to build search client"),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };

        let app = make_app(
            config,
            library,
            audio_reviews,
            search_client,
            Arc::new(vec![]),
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            uploads_path,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Thin wrapper over reqwest for talking to a [`TestServer`].
pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn add_movie(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/library", self.base_url))
            .json(body)
            .send()
            .await
            .expect("add request failed")
    }

    pub async fn remove_movie(&self, movie_id: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}/library/{}", self.base_url, movie_id))
            .send()
            .await
            .expect("remove request failed")
    }

    pub async fn get_library(&self) -> reqwest::Response {
        self.client
            .get(format!("{}/library", self.base_url))
            .send()
            .await
            .expect("list request failed")
    }

    pub async fn check_movie(&self, movie_id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/library/{}/check", self.base_url, movie_id))
            .send()
            .await
            .expect("check request failed")
    }

    pub async fn upload_audio(
        &self,
        movie_id: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        self.client
            .put(format!("{}/library/{}/audio", self.base_url, movie_id))
            .multipart(form)
            .send()
            .await
            .expect("upload request failed")
    }

    pub async fn stream_audio(&self, movie_id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/library/{}/audio", self.base_url, movie_id))
            .send()
            .await
            .expect("stream request failed")
    }

    pub async fn stream_audio_with_range(&self, movie_id: &str, range: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/library/{}/audio", self.base_url, movie_id))
            .header("Range", range)
            .send()
            .await
            .expect("stream request failed")
    }
}
