// src/downloader.rs
use crate::client::ProbingClient;
use crate::error::{DownloadError, Result};
use crate::retry::RetryPolicy;
use crate::state::{DownloadTarget, Strategy};
use crate::utils;
use crate::worker::{download_segment, download_single};
use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives a download: picks single-stream or parallel mode, fans out segment
/// workers, and restarts the whole operation on failure.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: ProbingClient,
    threads: usize,
    retry: RetryPolicy,
}

impl Downloader {
    /// `threads` below 1 is treated as 1.
    pub fn new(client: ProbingClient, threads: usize, retry: RetryPolicy) -> Self {
        Downloader {
            client,
            threads: threads.max(1),
            retry,
        }
    }

    /// Downloads `url` and returns the path that was written.
    ///
    /// `output` may name a file or a directory; see [`utils::resolve_output_path`].
    /// A failed attempt is retried from scratch up to the policy's budget, after
    /// which the last error is returned unchanged.
    pub async fn download(&self, url: &str, output: Option<&str>) -> Result<PathBuf> {
        let target = DownloadTarget {
            url: url.to_string(),
            destination: utils::resolve_output_path(&self.client, url, output).await?,
        };

        let total_attempts = self.retry.total_attempts();
        let mut attempt = 1;
        loop {
            match self.attempt(&target).await {
                Ok(()) => {
                    info!(
                        url,
                        path = %target.destination.display(),
                        attempt,
                        "download finished"
                    );
                    return Ok(target.destination);
                }
                Err(e) if attempt < total_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        url,
                        attempt,
                        total_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, restarting download"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "download failed, no attempts left");
                    return Err(e);
                }
            }
        }
    }

    /// One full attempt: probe, then fetch with the chosen strategy.
    async fn attempt(&self, target: &DownloadTarget) -> Result<()> {
        let capability = self.client.probe_capability(&target.url).await?;

        match capability.strategy() {
            Strategy::Parallel { total_size } => self.download_parallel(target, total_size).await,
            Strategy::SingleStream => {
                info!(url = %target.url, path = %target.destination.display(), "downloading");
                let bytes = download_single(&self.client, &target.url, &target.destination).await?;
                debug!(bytes, "single stream complete");
                Ok(())
            }
        }
    }

    async fn download_parallel(&self, target: &DownloadTarget, total_size: u64) -> Result<()> {
        info!(
            url = %target.url,
            path = %target.destination.display(),
            total_size,
            threads = self.threads,
            "downloading (threaded)"
        );

        // Pre-allocate the full length so workers never race on file growth.
        let path = &target.destination;
        let file = tokio::fs::File::create(path)
            .await
            .map_err(|e| DownloadError::filesystem(path, e))?;
        file.set_len(total_size)
            .await
            .map_err(|e| DownloadError::filesystem(path, e))?;
        drop(file);

        let segments = utils::calculate_segments(total_size, self.threads as u64);
        let url: Arc<str> = Arc::from(target.url.as_str());
        let path: Arc<PathBuf> = Arc::new(path.clone());

        let tasks = segments.into_iter().map(|segment| {
            let client = self.client.clone();
            let url = url.clone();
            let path = path.clone();
            tokio::spawn(async move { download_segment(&client, &url, segment, &path).await })
        });

        // Every worker runs to completion before the attempt is judged.
        let results = join_all(tasks).await;
        for result in results {
            result??;
        }

        Ok(())
    }
}
