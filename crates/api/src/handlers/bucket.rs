//! Handlers for the read-only bucket browser.
//!
//! Directories render as an HTML index (or JSON when the client asks for
//! `application/json`); files stream their raw bytes.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderMap};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use clea_batch_core::bucket::{list_directory, BucketEntry, BucketError, BucketTarget};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Canonical URL prefix of the browser.
pub const BUCKET_PREFIX: &str = "/bucket/v1/";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// JSON form of a directory listing.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    /// Path relative to the bucket root, no leading slash.
    pub path: String,
    pub entries: Vec<BucketEntry>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET / , /bucket , /bucket/v1
///
/// 302 to the canonical listing root.
pub async fn redirect_to_bucket() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, BUCKET_PREFIX)]).into_response()
}

/// GET /bucket/v1/
pub async fn browse_root(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    browse(&state, "", &headers).await
}

/// GET /bucket/v1/{*path}
pub async fn browse_path(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let Path(path) = path.map_err(|e| AppError::BadRequest(e.body_text()))?;
    browse(&state, &path, &headers).await
}

async fn browse(state: &AppState, requested: &str, headers: &HeaderMap) -> AppResult<Response> {
    match state.bucket.resolve(requested).await? {
        BucketTarget::Directory { path, relative } => {
            let entries = list_directory(&path).await?;
            tracing::debug!(relative = %relative, count = entries.len(), "Listing bucket directory");

            if wants_json(headers) {
                Ok(Json(ListingResponse {
                    path: relative,
                    entries,
                })
                .into_response())
            } else {
                Ok(Html(render_listing(&relative, &entries)).into_response())
            }
        }
        BucketTarget::File { path, relative, .. } => stream_file(&path, &relative).await,
    }
}

/// Stream a file's raw bytes.
async fn stream_file(path: &FsPath, relative: &str) -> AppResult<Response> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(BucketError::from)?;
    // Length of the opened file, which the batch may have rewritten since
    // resolution.
    let size = file.metadata().await.map_err(BucketError::from)?.len();
    let name = relative.rsplit('/').next().unwrap_or(relative);

    tracing::debug!(relative, size, "Serving bucket file");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for_extension(name))
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", header_safe_filename(name)),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Render the HTML index page of a directory.
fn render_listing(relative: &str, entries: &[BucketEntry]) -> String {
    let shown = if relative.is_empty() {
        BUCKET_PREFIX.to_string()
    } else {
        format!("{BUCKET_PREFIX}{relative}/")
    };
    let title = escape_html(&shown);

    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Index of {title}</title></head>\n\
         <body>\n<h1>Index of {title}</h1>\n<ul>\n"
    );

    if !relative.is_empty() {
        let parent = relative.rsplit_once('/').map_or("", |(p, _)| p);
        html.push_str(&format!(
            "<li><a href=\"{}\">../</a></li>\n",
            href_for(parent, true)
        ));
    }

    for entry in entries {
        let child = if relative.is_empty() {
            entry.name.clone()
        } else {
            format!("{relative}/{}", entry.name)
        };
        let label = if entry.is_dir {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let size = entry
            .size
            .map(|s| format!(" ({s} bytes)"))
            .unwrap_or_default();
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a>{size}</li>\n",
            href_for(&child, entry.is_dir),
            escape_html(&label)
        ));
    }

    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

/// Absolute browser URL of a relative bucket path.
fn href_for(relative: &str, is_dir: bool) -> String {
    let segments: Vec<String> = relative
        .split('/')
        .filter(|s| !s.is_empty())
        .map(encode_segment)
        .collect();

    let mut href = format!("{BUCKET_PREFIX}{}", segments.join("/"));
    if is_dir && !segments.is_empty() {
        href.push('/');
    }
    href
}

/// Percent-encode one path segment, keeping only RFC 3986 unreserved bytes.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Filename usable inside a quoted `Content-Disposition` parameter.
fn header_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Guess a Content-Type from a file extension.
fn content_type_for_extension(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "json" => "application/json",
        "txt" | "log" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "xml" => "application/xml",
        "gz" => "application/gzip",
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
