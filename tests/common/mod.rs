//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a tempdir-backed
//! blob store, and a full [`AppContext`]. The [`with_server`] constructor
//! starts Axum on a random port for HTTP-level testing.

use std::net::SocketAddr;
use std::sync::Arc;

use torget_blob::BlobStore;
use torget_core::config::Config;
use torget_core::UserId;
use torget_db::pool::{init_memory_pool, DbPool};
use torget_server::context::AppContext;
use torget_server::router::build_router;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary blob directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    // Held so the blob directory outlives the harness.
    _photo_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let photo_dir = tempfile::tempdir().expect("failed to create blob tempdir");
        let blobs =
            Arc::new(BlobStore::new(photo_dir.path()).expect("failed to create blob store"));

        let ctx = AppContext::new(db.clone(), config, blobs);

        Self {
            ctx,
            db,
            _photo_dir: photo_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::serve(Self::new()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::serve(Self::with_config(config)).await
    }

    async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> torget_db::pool::PooledConnection {
        torget_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Create a user directly in the database.
    pub fn create_user(&self, username: &str) -> UserId {
        let conn = self.conn();
        torget_db::queries::users::create_user(&conn, username, "hash", "user")
            .expect("failed to create user")
            .id
    }

    /// Create a user and a valid bearer token for them.
    pub fn user_with_token(&self, username: &str) -> (UserId, String) {
        let user_id = self.create_user(username);
        let token = format!("token-{username}");
        let conn = self.conn();
        torget_db::queries::auth::create_token(&conn, user_id, &token, "2099-01-01T00:00:00Z")
            .expect("failed to create token");
        (user_id, token)
    }
}

/// Config with authentication turned on (token-based only).
pub fn auth_enabled_config() -> Config {
    let mut config = Config::default();
    config.auth.enabled = true;
    config
}
