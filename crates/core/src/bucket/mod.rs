//! Read-only browser over the batch output directory (the "bucket").
//!
//! [`BucketRoot::resolve`] turns a request path into a [`BucketTarget`]
//! strictly inside the configured root; [`list_directory`] describes a
//! resolved directory.

pub mod listing;
pub mod resolve;

pub use listing::{list_directory, BucketEntry};
pub use resolve::{normalize_relative, BucketRoot, BucketTarget};

/// Errors raised while resolving or reading bucket paths.
#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    /// The path would leave the bucket root.
    #[error("Path escapes the bucket root: {0}")]
    Traversal(String),

    /// The path is syntactically unusable.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Nothing servable exists at the path.
    #[error("Not found: /{0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
