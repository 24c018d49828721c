//! Safe resolution of request paths against the bucket root.

use std::path::{Path, PathBuf};

use super::BucketError;

/// The configured top-level directory of the browser.
///
/// The root is canonicalized on every resolution rather than once at
/// startup: the batch may create it after the server is already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRoot {
    path: PathBuf,
}

/// What a request path points at, once resolved inside the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketTarget {
    /// A directory to list.
    Directory {
        /// Canonical filesystem path.
        path: PathBuf,
        /// Normalized path relative to the root, `/`-separated, no leading slash.
        relative: String,
    },
    /// A regular file to stream.
    File {
        /// Canonical filesystem path.
        path: PathBuf,
        /// Normalized path relative to the root.
        relative: String,
        /// File size in bytes.
        size: u64,
    },
}

impl BucketRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured (not canonicalized) root path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the root currently exists and is a directory.
    pub async fn is_readable(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Resolve `requested` (a `/`-separated path relative to the root) to a
    /// directory or file inside the root.
    ///
    /// Rejects paths whose `..` segments climb above the root, and paths whose
    /// symlinks lead outside it.
    pub async fn resolve(&self, requested: &str) -> Result<BucketTarget, BucketError> {
        let relative = normalize_relative(requested)?;

        let root = tokio::fs::canonicalize(&self.path)
            .await
            .map_err(|e| not_found_or_io(e, ""))?;

        let canonical = tokio::fs::canonicalize(root.join(&relative))
            .await
            .map_err(|e| not_found_or_io(e, &relative))?;

        if !canonical.starts_with(&root) {
            tracing::warn!(requested, resolved = %canonical.display(), "Bucket path escapes root");
            return Err(BucketError::Traversal(requested.to_string()));
        }

        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|e| not_found_or_io(e, &relative))?;

        if metadata.is_dir() {
            Ok(BucketTarget::Directory {
                path: canonical,
                relative,
            })
        } else if metadata.is_file() {
            Ok(BucketTarget::File {
                path: canonical,
                relative,
                size: metadata.len(),
            })
        } else {
            // Sockets, FIFOs and devices are not served.
            Err(BucketError::NotFound(relative))
        }
    }
}

/// Lexically normalize a request path.
///
/// Empty and `.` segments are dropped and `..` pops the previous segment.
/// A `..` with nothing left to pop would leave the root and is rejected.
pub fn normalize_relative(requested: &str) -> Result<String, BucketError> {
    if requested.contains('\0') {
        return Err(BucketError::InvalidPath(requested.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in requested.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(BucketError::Traversal(requested.to_string()));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

fn not_found_or_io(err: std::io::Error, relative: &str) -> BucketError {
    match err.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
            BucketError::NotFound(relative.to_string())
        }
        _ => BucketError::Io(err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
