//! Route definitions for the bucket browser.

use axum::routing::get;
use axum::Router;

use crate::handlers::bucket;
use crate::state::AppState;

/// ```text
/// GET    /                   -> redirect_to_bucket (302)
/// GET    /bucket             -> redirect_to_bucket (302)
/// GET    /bucket/            -> redirect_to_bucket (302)
/// GET    /bucket/v1          -> redirect_to_bucket (302)
/// GET    /bucket/v1/         -> browse_root
/// GET    /bucket/v1/{*path}  -> browse_path
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(bucket::redirect_to_bucket))
        .route("/bucket", get(bucket::redirect_to_bucket))
        .route("/bucket/", get(bucket::redirect_to_bucket))
        .route("/bucket/v1", get(bucket::redirect_to_bucket))
        .route("/bucket/v1/", get(bucket::browse_root))
        .route("/bucket/v1/{*path}", get(bucket::browse_path))
}
