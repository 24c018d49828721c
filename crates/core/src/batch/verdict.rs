//! Success/failure policy for finished batch runs.

use super::types::BatchOutput;

/// Outcome of a batch run as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchVerdict {
    /// The run is considered successful; carries captured stdout.
    Succeeded { stdout: String },
    /// The run is considered failed; carries the text to report.
    Failed { message: String },
}

impl From<BatchOutput> for BatchVerdict {
    /// Checks, in order:
    ///
    /// 1. any stderr output fails the run with stderr as the message,
    ///    regardless of the exit code;
    /// 2. a non-zero exit code fails the run with stdout as the message;
    /// 3. otherwise the run succeeded with stdout.
    fn from(output: BatchOutput) -> Self {
        // NOTE: diagnostic-only stderr from an otherwise successful batch still
        // fails the request. Kept as-is for compatibility with existing
        // callers; revisit together with the batch's own logging.
        if !output.stderr.is_empty() {
            return Self::Failed {
                message: output.stderr,
            };
        }
        if output.exit_code != 0 {
            return Self::Failed {
                message: output.stdout,
            };
        }
        Self::Succeeded {
            stdout: output.stdout,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
