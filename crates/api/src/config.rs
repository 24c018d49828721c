use std::path::PathBuf;
use std::time::Duration;

use clea_batch_core::batch::{BatchCommand, DEFAULT_BATCH_TIMEOUT};

/// Default bucket root when `CLEA_BATCH_CLUSTER_OUTPUT_PATH` is unset.
pub const DEFAULT_BUCKET_ROOT: &str = "/tmp/v1";

/// Default batch argument vector when `CLEA_BATCH_COMMAND` is unset.
pub const DEFAULT_BATCH_COMMAND: &str = "./clea-batch.sh";

/// Errors raised while loading [`ServerConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("CLEA_BATCH_COMMAND must name a program")]
    EmptyBatchCommand,

    #[error(
        "REQUEST_TIMEOUT_SECS ({request_secs}s) must be greater than \
         CLEA_BATCH_TIMEOUT_SECS ({batch_secs}s)"
    )]
    RequestTimeoutTooShort { request_secs: u64, batch_secs: u64 },
}

/// Server configuration loaded from environment variables.
///
/// Built once at startup and shared read-only through
/// [`AppState`](crate::state::AppState).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `300`).
    ///
    /// Must outlast the batch timeout, otherwise the middleware would answer
    /// before the batch is killed.
    pub request_timeout_secs: u64,
    /// Root directory of the bucket browser.
    pub bucket_root: PathBuf,
    /// The external batch invocation.
    pub batch: BatchCommand,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default            |
    /// |----------------------------------|--------------------|
    /// | `HOST`                           | `0.0.0.0`          |
    /// | `PORT`                           | `3000`             |
    /// | `REQUEST_TIMEOUT_SECS`           | `300`              |
    /// | `CLEA_BATCH_CLUSTER_OUTPUT_PATH` | `/tmp/v1`          |
    /// | `CLEA_BATCH_COMMAND`             | `./clea-batch.sh`  |
    /// | `CLEA_BATCH_WORKING_DIR`         | process cwd        |
    /// | `CLEA_BATCH_TIMEOUT_SECS`        | `180`              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var(&lookup, "PORT", "a valid u16", 3000)?;
        let request_timeout_secs: u64 =
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "a valid u64", 300)?;

        let bucket_root = lookup("CLEA_BATCH_CLUSTER_OUTPUT_PATH")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BUCKET_ROOT.into())
            .into();

        let batch_timeout_secs: u64 = parse_var(
            &lookup,
            "CLEA_BATCH_TIMEOUT_SECS",
            "a positive u64",
            DEFAULT_BATCH_TIMEOUT.as_secs(),
        )?;
        if batch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "CLEA_BATCH_TIMEOUT_SECS",
                expected: "a positive u64",
                value: "0".into(),
            });
        }

        let argv = lookup("CLEA_BATCH_COMMAND").unwrap_or_else(|| DEFAULT_BATCH_COMMAND.into());
        let mut batch = BatchCommand::from_argv(&argv, Duration::from_secs(batch_timeout_secs))
            .ok_or(ConfigError::EmptyBatchCommand)?;
        if let Some(dir) = lookup("CLEA_BATCH_WORKING_DIR").filter(|s| !s.trim().is_empty()) {
            batch = batch.with_working_directory(dir);
        }

        let config = Self {
            host,
            port,
            request_timeout_secs,
            bucket_root,
            batch,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let batch_secs = self.batch.timeout.as_secs();
        if self.request_timeout_secs <= batch_secs {
            return Err(ConfigError::RequestTimeoutTooShort {
                request_secs: self.request_timeout_secs,
                batch_secs,
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
