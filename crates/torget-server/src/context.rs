//! Service-oriented application context.
//!
//! [`AppContext`] is the central struct shared across all route handlers via
//! Axum state. It wraps the DB pool, the immutable configuration snapshot,
//! the blob store, and the marketplace service in `Arc`s so it is cheap to
//! clone per request.

use std::sync::Arc;

use torget_blob::BlobStore;
use torget_core::config::Config;
use torget_db::pool::DbPool;

use crate::market::MarketplaceService;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s and pool handles.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Photo blob store.
    pub blobs: Arc<BlobStore>,
    /// Marketplace operations (listings, purchases, photo serving).
    pub market: Arc<MarketplaceService>,
}

impl AppContext {
    /// Assemble a context from its parts.
    pub fn new(db: DbPool, config: Config, blobs: Arc<BlobStore>) -> Self {
        let market = Arc::new(MarketplaceService::new(db.clone(), blobs.clone()));
        Self {
            db,
            config: Arc::new(config),
            blobs,
            market,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_cloneable() {
        let db = torget_db::pool::init_memory_pool().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(BlobStore::new(dir.path()).unwrap());
        let ctx = AppContext::new(db, Config::default(), blobs);
        let clone = ctx.clone();
        assert_eq!(clone.config.server.port, ctx.config.server.port);
    }
}
