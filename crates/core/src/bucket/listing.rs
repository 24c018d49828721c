//! Directory listing for the bucket browser.

use std::cmp::Ordering;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use super::BucketError;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketEntry {
    /// File or directory name (lossy UTF-8).
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes; `None` for directories.
    pub size: Option<u64>,
    /// Last modification time in seconds since the Unix epoch, when known.
    pub modified: Option<u64>,
}

/// List the immediate children of `dir`, directories first, then by name.
///
/// Symlinks are described by their target. Dangling symlinks are skipped.
pub async fn list_directory(dir: &Path) -> Result<Vec<BucketEntry>, BucketError> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let metadata = match tokio::fs::metadata(entry.path()).await {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let is_dir = metadata.is_dir();
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());

        entries.push(BucketEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            size: (!is_dir).then(|| metadata.len()),
            modified,
        });
    }

    entries.sort_by(compare_entries);
    Ok(entries)
}

fn compare_entries(a: &BucketEntry, b: &BucketEntry) -> Ordering {
    b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name))
}
