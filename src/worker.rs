use crate::client::{ByteStream, ProbingClient};
use crate::error::{DownloadError, Result};
use crate::state::Segment;
use reqwest::StatusCode;
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufWriter};
use tracing::debug;

/// Downloads one segment into its window of an already preallocated file.
///
/// Opens its own handle to `path`, so any number of segments can run
/// concurrently as long as their windows do not overlap.
///
/// # Errors
///
/// Fails on any HTTP, transport or filesystem error, with
/// [`DownloadError::RangeNotHonoured`] before touching the file when a window
/// past offset 0 gets a non-206 answer, and with
/// [`DownloadError::SegmentLength`] when the body does not exactly fill the window.
pub async fn download_segment(
    client: &ProbingClient,
    url: &str,
    segment: Segment,
    path: &Path,
) -> Result<()> {
    debug!(
        index = segment.index,
        start = segment.start,
        end = segment.end,
        "downloading segment"
    );

    let mut stream = client.open_stream(url, Some(&segment)).await?;

    // A full-body answer only lines up with a window that starts at offset 0.
    if stream.status() != StatusCode::PARTIAL_CONTENT && segment.start != 0 {
        return Err(DownloadError::RangeNotHonoured {
            index: segment.index,
            status: stream.status(),
        });
    }

    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(|e| DownloadError::filesystem(path, e))?;

    let mut writer = BufWriter::new(file);
    writer
        .get_mut()
        .seek(SeekFrom::Start(segment.start))
        .await
        .map_err(|e| DownloadError::filesystem(path, e))?;

    let expected = segment.len();
    while let Some(bytes) = stream.next_chunk().await? {
        // A server that ignores Range sends the whole file; stop before
        // spilling into the next window.
        if stream.received() > expected {
            return Err(DownloadError::SegmentLength {
                index: segment.index,
                expected,
                received: stream.received(),
            });
        }
        writer
            .write_all(&bytes)
            .await
            .map_err(|e| DownloadError::filesystem(path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::filesystem(path, e))?;

    if stream.received() != expected {
        return Err(DownloadError::SegmentLength {
            index: segment.index,
            expected,
            received: stream.received(),
        });
    }

    debug!(index = segment.index, bytes = expected, "segment complete");
    Ok(())
}

/// Streams the whole body into `path`, creating or truncating it.
pub async fn download_single(client: &ProbingClient, url: &str, path: &Path) -> Result<u64> {
    let stream = client.open_stream(url, None).await?;

    let file = tokio::fs::File::create(path)
        .await
        .map_err(|e| DownloadError::filesystem(path, e))?;

    copy_stream(stream, BufWriter::new(file), path).await
}

async fn copy_stream(
    mut stream: ByteStream,
    mut writer: BufWriter<tokio::fs::File>,
    path: &Path,
) -> Result<u64> {
    while let Some(bytes) = stream.next_chunk().await? {
        writer
            .write_all(&bytes)
            .await
            .map_err(|e| DownloadError::filesystem(path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::filesystem(path, e))?;

    Ok(stream.received())
}
