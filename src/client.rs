//! HTTP access for the download engine.
//!
//! [`ProbingClient`] owns the single connection pool used for every probe and
//! stream of a download, so keep-alive connections are reused across segments
//! and retries.
use crate::error::{DownloadError, Result};
use crate::state::{Capability, Segment};
use bytes::Bytes;
use reqwest::header::{HeaderMap, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};

/// Timeout for the HEAD capability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the extension sniffing request.
pub const SNIFF_TIMEOUT: Duration = Duration::from_secs(5);
/// Extension used when sniffing finds nothing.
pub const DEFAULT_EXTENSION: &str = ".bin";

const SNIFF_LEN: usize = 8;

/// Hex-encoded leading bytes and the extension they imply. First match wins.
const SIGNATURES: &[(&str, &str)] = &[
    ("25504446", ".pdf"),
    ("89504e47", ".png"),
    ("ffd8ffe0", ".jpg"),
    ("504b0304", ".zip"),
    ("47494638", ".gif"),
    ("66747970", ".mp4"),
    ("3c3f786d6c", ".xml"),
    ("3c21444f", ".html"),
    ("7b22636f", ".json"),
];

/// Settings used to build the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Sent with every request (user `-H` headers and the folded `Cookie`).
    pub headers: HeaderMap,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Longest wait for any single read; a stalled body fails the attempt.
    pub read_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            headers: HeaderMap::new(),
            user_agent: format!("threadracer/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbingClient {
    client: Client,
}

impl ProbingClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(options.user_agent)
            .default_headers(options.headers)
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            .build()?;

        Ok(ProbingClient { client })
    }

    /// Issues a HEAD request and reports range support and size.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Http`] on a non-success status and
    /// [`DownloadError::Transport`] when the request cannot be completed.
    pub async fn probe_capability(&self, url: &str) -> Result<Capability> {
        let response = self.client.head(url).timeout(PROBE_TIMEOUT).send().await?;
        let response = check_status(response, url)?;

        let capability = Capability::from_headers(response.headers());
        debug!(
            url,
            supports_ranges = capability.supports_ranges,
            total_size = capability.total_size,
            "probed capability"
        );
        Ok(capability)
    }

    /// Opens a GET stream, limited to `segment` when one is given.
    pub async fn open_stream(&self, url: &str, segment: Option<&Segment>) -> Result<ByteStream> {
        let mut request = self.client.get(url);
        if let Some(segment) = segment {
            request = request.header(RANGE, segment.range_header());
        }

        let response = check_status(request.send().await?, url)?;
        Ok(ByteStream::new(response))
    }

    /// Guesses a file extension (with leading dot) from the first bytes of the body.
    ///
    /// Never fails: any status or transport error yields [`DEFAULT_EXTENSION`].
    pub async fn detect_extension(&self, url: &str) -> String {
        match self.read_prefix(url).await {
            Ok(prefix) => extension_for_prefix(&prefix).to_string(),
            Err(e) => {
                debug!(url, error = %e, "extension sniffing failed");
                DEFAULT_EXTENSION.to_string()
            }
        }
    }

    async fn read_prefix(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).timeout(SNIFF_TIMEOUT).send().await?;
        let mut stream = ByteStream::new(check_status(response, url)?);

        let mut prefix = Vec::with_capacity(SNIFF_LEN);
        while prefix.len() < SNIFF_LEN {
            let Some(chunk) = stream.next_chunk().await? else {
                break;
            };
            let take = (SNIFF_LEN - prefix.len()).min(chunk.len());
            prefix.extend_from_slice(&chunk[..take]);
        }
        Ok(prefix)
    }
}

/// A finite, non-restartable sequence of body chunks.
pub struct ByteStream {
    response: Response,
    received: u64,
}

impl ByteStream {
    fn new(response: Response) -> Self {
        ByteStream {
            response,
            received: 0,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Returns the next chunk, or `None` once the body is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let chunk = self.response.chunk().await?;
        if let Some(ref bytes) = chunk {
            self.received += bytes.len() as u64;
            trace!(len = bytes.len(), "received chunk");
        }
        Ok(chunk)
    }

    /// Total bytes yielded so far.
    pub fn received(&self) -> u64 {
        self.received
    }
}

fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DownloadError::Http {
            status,
            url: url.to_string(),
        })
    }
}

/// Matches leading bytes against the signature table.
pub fn extension_for_prefix(prefix: &[u8]) -> &'static str {
    let sig = hex::encode(prefix);
    SIGNATURES
        .iter()
        .find(|(magic, _)| sig.starts_with(*magic))
        .map(|(_, ext)| *ext)
        .unwrap_or(DEFAULT_EXTENSION)
}
