//! Error types surfaced by the download engine.
//!
//! Every failure is classified as an HTTP failure (the server answered with a
//! non-success status), a transport failure (the bytes never arrived), or a
//! filesystem failure (the bytes could not be stored). The CLI relies on
//! [`DownloadError::is_http`] to pick its error message.
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered a probe or a stream request with a non-2xx status.
    #[error("{status} for url ({url})")]
    Http { status: StatusCode, url: String },

    /// Connection, DNS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("filesystem error on {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A ranged body did not match the size of its window.
    #[error("segment {index} expected {expected} bytes but received {received}")]
    SegmentLength {
        index: usize,
        expected: u64,
        received: u64,
    },

    /// A ranged request for a window past the start of the file was answered
    /// with something other than `206 Partial Content`.
    #[error("segment {index} requested a range but the server answered {status}")]
    RangeNotHonoured { index: usize, status: StatusCode },

    #[error("segment worker failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl DownloadError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a non-success HTTP status.
    pub fn is_http(&self) -> bool {
        matches!(self, DownloadError::Http { .. })
    }

    /// The HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DownloadError::Http { status, .. } => Some(*status),
            DownloadError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
