#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use clea_batch_core::batch::BatchCommand;
use http_body_util::BodyExt;
use tower::ServiceExt;

use clea_batch_api::config::ServerConfig;
use clea_batch_api::router::build_app_router;
use clea_batch_api::state::AppState;

/// Build a test `ServerConfig` serving `bucket_root` and running `batch`.
///
/// The request timeout is kept one minute above the batch timeout.
pub fn test_config(bucket_root: &Path, batch: BatchCommand) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: batch.timeout.as_secs() + 60,
        bucket_root: bucket_root.to_path_buf(),
        batch,
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(config: ServerConfig) -> Router {
    let state = AppState::new(config.clone());
    build_app_router(state, &config)
}

/// Write `body` to an `sh` script inside `dir` and return its path.
pub fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("batch.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
    path
}

/// A batch command running `script` through `sh`.
pub fn sh_batch(script: &Path, timeout: Duration) -> BatchCommand {
    BatchCommand {
        program: "sh".to_string(),
        args: vec![script.to_str().expect("utf-8 path").to_string()],
        working_directory: None,
        timeout,
    }
}

/// A batch command that is never expected to run.
pub fn unused_batch() -> BatchCommand {
    BatchCommand {
        program: "true".to_string(),
        args: vec![],
        working_directory: None,
        timeout: Duration::from_secs(5),
    }
}

pub async fn send(app: Router, method: Method, uri: &str, accept: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(accept) = accept {
        builder = builder.header("accept", accept);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
