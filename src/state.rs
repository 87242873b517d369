//! Per-attempt download state.
//!
//! Nothing here is persisted: a capability is re-probed and the segments are
//! recomputed on every attempt.
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap};
use std::path::PathBuf;

/// The URL being fetched and where its bytes end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub destination: PathBuf,
}

/// What a HEAD probe told us about the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capability {
    /// `Accept-Ranges: bytes` was present.
    pub supports_ranges: bool,
    /// `Content-Length`, or 0 when absent or unparseable.
    pub total_size: u64,
}

impl Capability {
    /// Reads `Accept-Ranges` and `Content-Length` from probe response headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let supports_ranges = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"));

        let total_size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Capability {
            supports_ranges,
            total_size,
        }
    }

    pub fn strategy(&self) -> Strategy {
        if self.supports_ranges && self.total_size > 0 {
            Strategy::Parallel {
                total_size: self.total_size,
            }
        } else {
            Strategy::SingleStream
        }
    }
}

/// How a single attempt fetches the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SingleStream,
    Parallel { total_size: u64 },
}

/// A contiguous byte window of the target file owned by one worker.
///
/// The range is inclusive, meaning `start` and `end` are both part of the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Range` request header.
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_capability_with_ranges_and_length() {
        let cap = Capability::from_headers(&headers(&[
            ("accept-ranges", "Bytes"),
            ("content-length", "1000000"),
        ]));
        assert!(cap.supports_ranges);
        assert_eq!(cap.total_size, 1_000_000);
        assert_eq!(
            cap.strategy(),
            Strategy::Parallel {
                total_size: 1_000_000
            }
        );
    }

    #[test]
    fn test_capability_missing_accept_ranges() {
        let cap = Capability::from_headers(&headers(&[("content-length", "500")]));
        assert!(!cap.supports_ranges);
        assert_eq!(cap.strategy(), Strategy::SingleStream);
    }

    #[test]
    fn test_capability_accept_ranges_none() {
        let cap = Capability::from_headers(&headers(&[
            ("accept-ranges", "none"),
            ("content-length", "500"),
        ]));
        assert_eq!(cap.strategy(), Strategy::SingleStream);
    }

    #[test]
    fn test_capability_bad_length_falls_back() {
        let cap = Capability::from_headers(&headers(&[
            ("accept-ranges", "bytes"),
            ("content-length", "lots"),
        ]));
        assert!(cap.supports_ranges);
        assert_eq!(cap.total_size, 0);
        // Ranges without a size must not produce a parallel plan.
        assert_eq!(cap.strategy(), Strategy::SingleStream);
    }

    #[test]
    fn test_segment_range_header() {
        let seg = Segment {
            index: 1,
            start: 250_000,
            end: 499_999,
        };
        assert_eq!(seg.len(), 250_000);
        assert_eq!(seg.range_header(), "bytes=250000-499999");
    }
}
