//! Integration tests for `POST /batch`.

mod common;

use std::time::{Duration, Instant};

use axum::http::{header, StatusCode};
use clea_batch_core::batch::BatchCommand;
use clea_batch_api::config::ServerConfig;
use common::{body_json, body_text, build_test_app, post, sh_batch, test_config, write_script};

/// Wait for `pid` to exit. A zombie left for init counts as exited.
async fn assert_process_gone(pid: &str) {
    if !std::path::Path::new("/proc/self").exists() {
        return;
    }
    let stat_path = format!("/proc/{pid}/stat");
    for _ in 0..40 {
        let Ok(stat) = std::fs::read_to_string(&stat_path) else {
            return;
        };
        if stat.rsplit(')').next().and_then(|rest| rest.trim().chars().next()) == Some('Z') {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("batch process {pid} should be gone");
}

fn app_for_script(dir: &tempfile::TempDir, body: &str, timeout: Duration) -> axum::Router {
    let script = write_script(dir.path(), body);
    build_test_app(test_config(dir.path(), sh_batch(&script, timeout)))
}

// ---------------------------------------------------------------------------
// Test: clean exit returns 200 with stdout as plain text
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_batch_returns_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for_script(&dir, "printf OK\n", Duration::from_secs(10));

    let response = post(app, "/batch").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body_text(response).await, "OK");
}

// ---------------------------------------------------------------------------
// Test: stderr output fails the request even on exit code 0
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stderr_output_fails_despite_zero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for_script(&dir, "printf OK\nprintf warn >&2\n", Duration::from_secs(10));

    let response = post(app, "/batch").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "warn");
}

// ---------------------------------------------------------------------------
// Test: non-zero exit without stderr reports stdout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nonzero_exit_reports_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for_script(&dir, "printf fail\nexit 2\n", Duration::from_secs(10));

    let response = post(app, "/batch").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "fail");
}

// ---------------------------------------------------------------------------
// Test: a batch that never ends is killed and reported as a timeout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hanging_batch_times_out_and_is_killed() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let app = app_for_script(
        &dir,
        &format!("echo $$ > {}\nexec sleep 600\n", pid_file.display()),
        Duration::from_secs(1),
    );

    let started = Instant::now();
    let response = post(app, "/batch").await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Batch timed out after 1 seconds");

    let pid = std::fs::read_to_string(&pid_file).unwrap();
    assert_process_gone(pid.trim()).await;
}

// ---------------------------------------------------------------------------
// Test: a background process holding the pipes cannot stretch the timeout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn background_process_does_not_extend_the_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("pid");
    let app = app_for_script(
        &dir,
        &format!("sleep 30 &\necho $! > {}\nprintf OK\n", pid_file.display()),
        Duration::from_secs(1),
    );

    let started = Instant::now();
    let response = post(app, "/batch").await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Batch timed out after 1 seconds");

    let pid = std::fs::read_to_string(&pid_file).unwrap();
    assert_process_gone(pid.trim()).await;
}

// ---------------------------------------------------------------------------
// Test: the global request timeout answers with the envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_timeout_returns_408_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "exec sleep 5\n");
    let app = build_test_app(ServerConfig {
        request_timeout_secs: 1,
        ..test_config(dir.path(), sh_batch(&script, Duration::from_secs(10)))
    });

    let response = post(app, "/batch").await;

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Request timed out");
}

// ---------------------------------------------------------------------------
// Test: a missing executable is reported as a 500 envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_executable_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let batch = BatchCommand {
        program: dir.path().join("no-such-batch").display().to_string(),
        args: vec![],
        working_directory: None,
        timeout: Duration::from_secs(5),
    };
    let app = build_test_app(test_config(dir.path(), batch));

    let response = post(app, "/batch").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to start batch command"));
}

// ---------------------------------------------------------------------------
// Test: the command runs in the configured working directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn relative_command_runs_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "printf from-workdir\n");
    let batch = BatchCommand::from_argv("sh ./batch.sh", Duration::from_secs(10))
        .unwrap()
        .with_working_directory(dir.path());
    let app = build_test_app(test_config(dir.path(), batch));

    let response = post(app, "/batch").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "from-workdir");
}

// ---------------------------------------------------------------------------
// Test: concurrent requests each launch their own run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_requests_are_not_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let runs = dir.path().join("runs");
    let app = app_for_script(
        &dir,
        &format!("echo run >> {}\nsleep 0.3\nprintf done\n", runs.display()),
        Duration::from_secs(10),
    );

    let (first, second) = tokio::join!(post(app.clone(), "/batch"), post(app, "/batch"));

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    let log = std::fs::read_to_string(&runs).unwrap();
    assert_eq!(log.lines().count(), 2);
}

// ---------------------------------------------------------------------------
// Test: only POST is accepted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_on_batch_is_method_not_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for_script(&dir, "printf OK\n", Duration::from_secs(10));

    let response = common::get(app, "/batch").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Method not allowed");
}
