//! Route definitions for the batch trigger.

use axum::routing::post;
use axum::Router;

use crate::handlers::batch;
use crate::state::AppState;

/// ```text
/// POST   /batch    -> trigger_batch
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/batch", post(batch::trigger_batch))
}
