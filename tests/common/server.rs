//! A real server per test, on an ephemeral port, torn down on drop.

use super::constants::*;
use home_library_server::library::{InMemoryLibraryStore, LibraryStore, SqliteLibraryStore};
use home_library_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use home_library_server::user::{
    CredentialsHasher, InMemoryUserStore, SqliteUserStore, TokenIssuer, TokenSettings,
    UserManager, UserStore,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub struct TestServer {
    /// e.g. "http://127.0.0.1:40123"
    pub base_url: String,
    pub port: u16,

    /// The stores behind the server, for setup and assertions that bypass HTTP.
    pub library: Arc<dyn LibraryStore>,
    pub user_manager: Arc<UserManager>,

    _db_dir: Option<TempDir>,
    _stop: Option<oneshot::Sender<()>>,
}

fn test_user_manager(user_store: Box<dyn UserStore>) -> Arc<UserManager> {
    let tokens = TokenIssuer::new(TokenSettings {
        access_secret: TEST_JWT_SECRET.to_string(),
        refresh_secret: TEST_JWT_REFRESH_SECRET.to_string(),
        access_ttl: Duration::from_secs(3600),
        refresh_ttl: Duration::from_secs(86400),
    });
    let user_manager = UserManager::new(
        user_store,
        CredentialsHasher::new(TEST_HASH_MEMORY_KIB),
        tokens,
    );
    user_manager
        .create_user(TEST_USER, TEST_PASS)
        .expect("test user should be creatable");
    Arc::new(user_manager)
}

impl TestServer {
    /// Volatile stores.
    pub async fn spawn() -> Self {
        let library: Arc<dyn LibraryStore> = Arc::new(InMemoryLibraryStore::new());
        Self::start(library, Box::new(InMemoryUserStore::new()), None).await
    }

    /// SQLite stores in a fresh temporary directory.
    pub async fn spawn_sqlite() -> Self {
        let db_dir = TempDir::new().expect("temp dir");
        let library: Arc<dyn LibraryStore> = Arc::new(
            SqliteLibraryStore::new(db_dir.path().join("library.db")).expect("library.db"),
        );
        let users = SqliteUserStore::new(db_dir.path().join("user.db")).expect("user.db");
        Self::start(library, Box::new(users), Some(db_dir)).await
    }

    async fn start(
        library: Arc<dyn LibraryStore>,
        user_store: Box<dyn UserStore>,
        db_dir: Option<TempDir>,
    ) -> Self {
        let user_manager = test_user_manager(user_store);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let app = make_app(
            ServerConfig {
                port,
                metrics_port: 0,
                requests_logging_level: RequestsLoggingLevel::None,
            },
            library.clone(),
            user_manager.clone(),
        );
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
                .expect("test server crashed");
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            port,
            library,
            user_manager,
            _db_dir: db_dir,
            _stop: Some(stop_tx),
        };
        server.wait_until_serving().await;
        server
    }

    async fn wait_until_serving(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("reqwest client");
        let deadline = Instant::now() + Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        while Instant::now() < deadline {
            let probe = client.get(format!("{}/", self.base_url)).send().await;
            if matches!(probe, Ok(ref response) if response.status().is_success()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
        panic!("server at {} never became ready", self.base_url);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self._stop.take() {
            let _ = stop.send(());
        }
    }
}
