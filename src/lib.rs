//! # threadracer Download Library
//!
//! `threadracer` downloads large files by splitting them into byte ranges that
//! are fetched concurrently, falling back to a single stream when the server
//! does not support partial content.
//!
//! - [`client::ProbingClient`] probes range support and size, opens body
//!   streams and sniffs file extensions.
//! - [`downloader::Downloader`] picks a strategy, fans out one worker per
//!   segment and restarts the whole download on failure.
//! - [`retry::RetryPolicy`] decides how often and how long to wait.
//!
//! ## Example Usage
//!
//! ```no_run
//! use threadracer::{ClientOptions, Downloader, ProbingClient, RetryPolicy};
//!
//! # async fn run() -> threadracer::error::Result<()> {
//! let client = ProbingClient::new(ClientOptions::default())?;
//! let downloader = Downloader::new(client, 4, RetryPolicy::default());
//! let path = downloader.download("https://example.com/big.iso", None).await?;
//! println!("saved to {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod client;
pub mod config;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod retry;
pub mod state;
pub mod utils;
pub mod worker;

pub use args::Args;
pub use client::{ClientOptions, ProbingClient};
pub use downloader::Downloader;
pub use error::DownloadError;
pub use retry::RetryPolicy;
pub use state::{Capability, DownloadTarget, Segment, Strategy};
pub use worker::download_segment;
