//! External batch invocation.
//!
//! The batch is an opaque executable: it is launched with an argument
//! vector, communicates only through its exit code, stdout and stderr, and
//! is killed when it outlives its timeout.

pub mod subprocess;
pub mod types;
pub mod verdict;

pub use subprocess::run_batch;
pub use types::{BatchCommand, BatchError, BatchOutput, DEFAULT_BATCH_TIMEOUT};
pub use verdict::BatchVerdict;
