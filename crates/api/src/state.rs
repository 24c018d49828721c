use std::sync::Arc;

use clea_batch_core::bucket::BucketRoot;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable and read-only; handlers share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration, built once at startup.
    pub config: Arc<ServerConfig>,
    /// Root of the bucket browser.
    pub bucket: BucketRoot,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let bucket = BucketRoot::new(config.bucket_root.clone());
        Self {
            config: Arc::new(config),
            bucket,
        }
    }
}
