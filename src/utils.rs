//! Utility helpers used across the crate.
//!
//! Segment calculation, output path derivation, and turning CLI header and
//! cookie strings into request headers.
use crate::client::ProbingClient;
use crate::error::{DownloadError, Result};
use crate::state::Segment;
use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sanitize_filename::sanitize;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tracing::debug;
use url::Url;

/// Base name used when the URL carries no file name.
const FALLBACK_STEM: &str = "download";

/// Divides a total file size into contiguous segments for concurrent downloading.
///
/// The last segment absorbs the remainder of the integer division. When the
/// file has fewer bytes than `num_threads`, one single-byte segment is produced
/// per byte instead. Returns an empty list for an empty file.
pub fn calculate_segments(total_size: u64, num_threads: u64) -> Vec<Segment> {
    let count = num_threads.max(1).min(total_size);
    if count == 0 {
        return Vec::new();
    }

    let segment_size = total_size / count;
    (0..count)
        .map(|i| {
            let start = i * segment_size;
            let end = if i == count - 1 {
                total_size - 1
            } else {
                start + segment_size - 1
            };

            Segment {
                index: i as usize,
                start,
                end,
            }
        })
        .collect()
}

/// Extracts a clean filename from a URL.
///
/// 1. Parses the URL.
/// 2. Extracts the last segment of the path.
/// 3. URL-decodes it (converts %20 to space, etc.).
/// 4. Sanitizes it to remove characters invalid for the OS.
///
/// Returns `None` when no usable name remains.
pub fn get_filename_from_url(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|mut s| s.next_back().unwrap_or("").to_string())
        })
        .map(|s| percent_decode_str(&s).decode_utf8_lossy().to_string())
        .map(sanitize)
        .filter(|s| !s.is_empty())
}

/// Works out where a download should be written.
///
/// * No hint: a name derived from the URL, in the current directory.
/// * A hint naming an existing directory, or ending in a path separator:
///   the derived name inside that directory, which is created if missing.
/// * Any other hint is used as the file path as-is.
///
/// The derived name is the URL's file name. If that has no extension, the
/// extension sniffed from the body is appended; if the URL has no file name
/// at all, `download` plus the sniffed extension is used.
pub async fn resolve_output_path(
    client: &ProbingClient,
    url: &str,
    hint: Option<&str>,
) -> Result<PathBuf> {
    let dir = match hint {
        None => PathBuf::from("."),
        Some(h) if is_directory_hint(h) => {
            tokio::fs::create_dir_all(h)
                .await
                .map_err(|e| DownloadError::filesystem(h, e))?;
            PathBuf::from(h)
        }
        Some(h) => return Ok(PathBuf::from(h)),
    };

    let name = match get_filename_from_url(url) {
        Some(name) if Path::new(&name).extension().is_some() => name,
        Some(name) => format!("{}{}", name, client.detect_extension(url).await),
        None => format!("{}{}", FALLBACK_STEM, client.detect_extension(url).await),
    };

    let path = dir.join(name);
    debug!(url, path = %path.display(), "resolved output path");
    Ok(path)
}

fn is_directory_hint(hint: &str) -> bool {
    hint.ends_with('/') || hint.ends_with(MAIN_SEPARATOR) || Path::new(hint).is_dir()
}

/// Parses `Key: Value` strings into a header map.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidHeader`] when a string has no colon, or the
/// name or value is not valid in an HTTP header.
pub fn parse_headers(raw: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    for line in raw {
        let (key, value) = line.split_once(':').ok_or_else(|| {
            DownloadError::InvalidHeader(format!("expected `Key: Value`, got `{line}`"))
        })?;

        let name = HeaderName::from_bytes(key.trim().as_bytes()).map_err(|_| {
            DownloadError::InvalidHeader(format!("bad header name `{}`", key.trim()))
        })?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| {
            DownloadError::InvalidHeader(format!("bad value for header `{name}`"))
        })?;

        headers.append(name, value);
    }

    Ok(headers)
}

/// Folds `name=value` (or `name: value`) cookie strings into one `Cookie` header value.
///
/// Returns `Ok(None)` when no cookies were given.
pub fn parse_cookies(raw: &[String]) -> Result<Option<HeaderValue>> {
    let mut pairs = Vec::with_capacity(raw.len());

    for cookie in raw {
        let (name, value) = cookie
            .split_once('=')
            .or_else(|| cookie.split_once(':'))
            .ok_or_else(|| {
                DownloadError::InvalidHeader(format!(
                    "expected `name=value` cookie, got `{cookie}`"
                ))
            })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(DownloadError::InvalidHeader(format!(
                "cookie `{cookie}` has an empty name"
            )));
        }
        pairs.push(format!("{}={}", name, value.trim()));
    }

    if pairs.is_empty() {
        return Ok(None);
    }

    HeaderValue::from_str(&pairs.join("; "))
        .map(Some)
        .map_err(|_| DownloadError::InvalidHeader("cookie contains invalid characters".into()))
}
