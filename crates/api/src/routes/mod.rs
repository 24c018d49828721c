pub mod batch;
pub mod bucket;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// ```text
/// /health                  service health
/// /batch                   run the external batch (POST)
/// / , /bucket, /bucket/v1  redirect to /bucket/v1/
/// /bucket/v1/{*path}       directory listing or file content
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(batch::router())
        .merge(bucket::router())
}
