//! Batch subprocess management.
//!
//! Provides [`run_batch`]: spawn the configured argument vector, capture
//! stdout/stderr, and enforce the timeout. One deadline covers the wait and
//! both pipe drains. On expiry the whole process group is killed and the
//! child reaped before a timeout is reported.

use std::io;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::types::{BatchCommand, BatchError, BatchOutput};

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output exceeding this limit is discarded.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Run `batch` to completion or until its timeout expires.
///
/// No shell is involved: `program` is executed directly with `args`.
/// stdin is connected to `/dev/null`. On Unix the child leads its own
/// process group, so background processes it starts are killed with it.
pub async fn run_batch(batch: &BatchCommand) -> Result<BatchOutput, BatchError> {
    let mut cmd = Command::new(&batch.program);
    cmd.args(&batch.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // A dropped request future must not leak the child.
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    if let Some(dir) = &batch.working_directory {
        cmd.current_dir(dir);
    }

    tracing::info!(program = %batch.program, args = ?batch.args, "Starting batch");
    let start = Instant::now();
    let deadline = tokio::time::Instant::now() + batch.timeout;

    let mut child = cmd.spawn().map_err(|source| {
        tracing::error!(program = %batch.program, error = %source, "Failed to spawn batch");
        BatchError::Spawn {
            program: batch.program.clone(),
            source,
        }
    })?;
    let pid = child.id();

    // Drain both pipes while waiting so a verbose child cannot block on a
    // full pipe buffer.
    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));
    let stdout_abort = stdout_task.abort_handle();
    let stderr_abort = stderr_task.abort_handle();

    // Descendants inherit the pipes, so the drains can outlive the child.
    let collected = tokio::time::timeout_at(deadline, async {
        let status = child.wait().await?;
        let stdout = join_stream(stdout_task, "stdout").await?;
        let stderr = join_stream(stderr_task, "stderr").await?;
        Ok::<_, io::Error>((status, stdout, stderr))
    })
    .await;

    match collected {
        Ok(Ok((status, stdout_bytes, stderr_bytes))) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let exit_code = status.code().unwrap_or(-1);

            tracing::info!(
                program = %batch.program,
                exit_code,
                duration_ms,
                stdout_bytes = stdout_bytes.len(),
                stderr_bytes = stderr_bytes.len(),
                "Batch finished"
            );

            Ok(BatchOutput {
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                exit_code,
                duration_ms,
            })
        }
        Ok(Err(e)) => {
            stdout_abort.abort();
            stderr_abort.abort();
            tracing::error!(program = %batch.program, error = %e, "Failed to collect batch output");
            Err(BatchError::Io(e))
        }
        Err(_elapsed) => {
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            // Reaps the child. Fails harmlessly when it was already reaped
            // and only descendants were holding the pipes.
            if let Err(e) = child.kill().await {
                tracing::debug!(program = %batch.program, error = %e, "Batch child already exited");
            }
            stdout_abort.abort();
            stderr_abort.abort();
            tracing::warn!(
                program = %batch.program,
                timeout_secs = batch.timeout.as_secs(),
                "Batch timed out and was killed"
            );
            Err(BatchError::Timeout {
                timeout: batch.timeout,
            })
        }
    }
}

/// Send SIGKILL to every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = i32::try_from(pid) else {
        return;
    };
    // Safety: kill(2) takes plain integers; a negative pid addresses the group.
    let ret = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if ret != 0 {
        let err = io::Error::last_os_error();
        tracing::debug!(pgid, error = %err, "Failed to signal batch process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
///
/// Bytes past the cap are still drained so the writer never blocks.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await?;
        tokio::io::copy(&mut h, &mut tokio::io::sink()).await?;
    }
    Ok(buf)
}

/// Await a reader task. A failed or panicked reader is an error, never
/// silently empty output.
async fn join_stream(
    task: JoinHandle<io::Result<Vec<u8>>>,
    stream: &'static str,
) -> io::Result<Vec<u8>> {
    match task.await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => {
            tracing::warn!(stream, error = %e, "Failed to read batch output");
            Err(e)
        }
        Err(e) => {
            tracing::warn!(stream, error = %e, "Batch output reader did not complete");
            Err(io::Error::other(e))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
