//! Handler for the batch trigger endpoint.

use axum::extract::State;
use clea_batch_core::batch::{self, BatchVerdict};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /batch
///
/// Runs the configured batch once and waits for it. Responds 200 with the
/// batch's stdout as plain text, or 500 with the failure text in the error
/// envelope. Concurrent requests each launch their own run.
pub async fn trigger_batch(State(state): State<AppState>) -> AppResult<String> {
    let output = batch::run_batch(&state.config.batch).await?;

    match BatchVerdict::from(output) {
        BatchVerdict::Succeeded { stdout } => Ok(stdout),
        BatchVerdict::Failed { message } => {
            tracing::warn!(message = %message, "Batch reported failure");
            Err(AppError::BatchFailed(message))
        }
    }
}
