//! Batch invocation types shared by the runner and the HTTP layer.
//!
//! Defines [`BatchCommand`], [`BatchOutput`] and [`BatchError`].

use std::path::PathBuf;
use std::time::Duration;

/// Default wall-clock bound for one batch run (3 minutes).
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(180);

/// A fully specified batch invocation.
///
/// The command is an argument vector: `program` is executed directly with
/// `args`, no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommand {
    /// Executable to launch, resolved relative to the working directory when
    /// it contains a path separator.
    pub program: String,
    /// Arguments passed verbatim to the program.
    pub args: Vec<String>,
    /// Working directory for the child process (inherits ours if `None`).
    pub working_directory: Option<PathBuf>,
    /// Maximum wall-clock time before the process is killed.
    pub timeout: Duration,
}

impl BatchCommand {
    /// Build a command from a whitespace-separated argument vector.
    ///
    /// Returns `None` when `argv` holds no words.
    pub fn from_argv(argv: &str, timeout: Duration) -> Option<Self> {
        let mut words = argv.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
            working_directory: None,
            timeout,
        })
    }

    /// Set the working directory of the child process.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}

/// Captured output from a finished batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    /// Complete stdout captured from the process (lossy UTF-8).
    pub stdout: String,
    /// Complete stderr captured from the process (lossy UTF-8).
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Errors that prevent a batch run from producing a [`BatchOutput`].
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The program could not be started at all.
    #[error("Failed to start batch command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The run exceeded its timeout; the child was killed.
    #[error("Batch timed out after {} seconds", .timeout.as_secs())]
    Timeout {
        /// Configured bound that was exceeded.
        timeout: Duration,
    },

    /// Waiting on the child failed after it was spawned.
    #[error("I/O error while waiting for batch: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
