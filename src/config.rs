//! User settings loaded from `<config dir>/threadracer/config.json`.
//!
//! Every field is optional; command-line flags take precedence over the file
//! and the file takes precedence over built-in defaults.
use crate::args::Args;
use crate::client::{ClientOptions, ProbingClient};
use crate::downloader::Downloader;
use crate::error::DownloadError;
use crate::retry::RetryPolicy;
use crate::utils;
use anyhow::{Context, Result};
use reqwest::header::COOKIE;
use serde::{Deserialize, Serialize};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::Duration;

/// Segment workers used when neither `--threads` nor the settings file set one.
pub const DEFAULT_THREADS: u8 = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub threads: Option<u8>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub retry_growth_factor: Option<f64>,
    pub retry_max_delay_ms: Option<u64>,
    /// Directory downloads go to when `--output` is not given.
    pub default_dir: Option<String>,
    pub user_agent: Option<String>,
    /// Extra `Key: Value` headers sent with every request.
    pub headers: Vec<String>,
}

impl Settings {
    /// Location of the settings file, if the platform has a config directory.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("threadracer").join("config.json"))
    }

    /// Loads settings from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Builds a retry policy, falling back to defaults for unset fields.
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            base_delay: self
                .retry_base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            growth_factor: self.retry_growth_factor.unwrap_or(defaults.growth_factor),
            max_delay: self
                .retry_max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        }
    }

    /// The retry policy with `--retries` applied on top of the file.
    pub fn resolve_retry(&self, args: &Args) -> RetryPolicy {
        let mut retry = self.retry_policy();
        if let Some(retries) = args.retries {
            retry.max_retries = retries;
        }
        retry
    }

    pub fn resolve_threads(&self, args: &Args) -> usize {
        args.threads.or(self.threads).unwrap_or(DEFAULT_THREADS) as usize
    }

    /// Client options: file headers followed by `-H` headers, cookies folded
    /// into one `Cookie` header, and the file's user agent if set.
    pub fn client_options(&self, args: &Args) -> Result<ClientOptions, DownloadError> {
        let mut raw_headers = self.headers.clone();
        raw_headers.extend(args.headers.iter().cloned());

        let mut headers = utils::parse_headers(&raw_headers)?;
        if let Some(cookie) = utils::parse_cookies(&args.cookies)? {
            headers.insert(COOKIE, cookie);
        }

        let mut options = ClientOptions {
            headers,
            ..Default::default()
        };
        if let Some(ua) = &self.user_agent {
            options.user_agent = ua.clone();
        }
        Ok(options)
    }

    /// Where to write: `--output` as given, else `default_dir` as a directory.
    ///
    /// `default_dir` always gets a trailing separator so that a directory that
    /// does not exist yet is created rather than used as the file name.
    pub fn output_hint(&self, args: &Args) -> Option<String> {
        if let Some(output) = &args.output {
            return Some(output.clone());
        }

        self.default_dir.as_ref().map(|dir| {
            if dir.ends_with('/') || dir.ends_with(MAIN_SEPARATOR) {
                dir.clone()
            } else {
                format!("{}{}", dir, MAIN_SEPARATOR)
            }
        })
    }

    pub fn build_downloader(&self, args: &Args) -> Result<Downloader, DownloadError> {
        let client = ProbingClient::new(self.client_options(args)?)?;
        Ok(Downloader::new(
            client,
            self.resolve_threads(args),
            self.resolve_retry(args),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use reqwest::header::{AUTHORIZATION, USER_AGENT};
    use tempfile::tempdir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["threadracer", "-u", "http://example.com/big.iso"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let settings = Settings::load_from(&dir.path().join("config.json"))?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        Ok(())
    }

    #[test]
    fn test_partial_file_is_merged_with_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "threads": 8, "retry_base_delay_ms": 250, "headers": ["X-Token: abc"] }"#,
        )?;

        let settings = Settings::load_from(&path)?;
        assert_eq!(settings.threads, Some(8));
        assert_eq!(settings.headers, vec!["X-Token: abc".to_string()]);

        let policy = settings.retry_policy();
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ threads: ")?;
        assert!(Settings::load_from(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_threads_precedence() {
        let empty = Settings::default();
        let file = Settings {
            threads: Some(8),
            ..Default::default()
        };

        assert_eq!(empty.resolve_threads(&args(&[])), 4);
        assert_eq!(file.resolve_threads(&args(&[])), 8);
        assert_eq!(file.resolve_threads(&args(&["-t", "2"])), 2);
    }

    #[test]
    fn test_retries_flag_overrides_file() {
        let file = Settings {
            max_retries: Some(7),
            retry_base_delay_ms: Some(100),
            ..Default::default()
        };

        assert_eq!(file.resolve_retry(&args(&[])).max_retries, 7);

        let policy = file.resolve_retry(&args(&["-r", "0"]));
        assert_eq!(policy.max_retries, 0);
        // Backoff shape still comes from the file.
        assert_eq!(policy.base_delay, Duration::from_millis(100));
        assert_eq!(
            Settings::default().resolve_retry(&args(&[])),
            RetryPolicy::default()
        );
    }

    #[test]
    fn test_client_options_merge_headers_and_cookies() {
        let file = Settings {
            headers: vec!["Authorization: Bearer file".to_string()],
            user_agent: Some("custom-agent/2.0".to_string()),
            ..Default::default()
        };
        let options = file
            .client_options(&args(&[
                "-H",
                "X-Extra: 1",
                "-c",
                "session=abc",
                "-c",
                "theme=dark",
            ]))
            .unwrap();

        assert_eq!(options.headers[AUTHORIZATION], "Bearer file");
        assert_eq!(options.headers["x-extra"], "1");
        assert_eq!(options.headers[COOKIE], "session=abc; theme=dark");
        assert!(options.headers.get(USER_AGENT).is_none());
        assert_eq!(options.user_agent, "custom-agent/2.0");
    }

    #[test]
    fn test_client_options_defaults() {
        let options = Settings::default().client_options(&args(&[])).unwrap();
        assert!(options.headers.is_empty());
        assert!(options.user_agent.starts_with("threadracer/"));
    }

    #[test]
    fn test_client_options_rejects_bad_header() {
        let err = Settings::default()
            .client_options(&args(&["-H", "missing colon"]))
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidHeader(_)));
    }

    #[test]
    fn test_output_flag_beats_default_dir() {
        let file = Settings {
            default_dir: Some("/srv/downloads".to_string()),
            ..Default::default()
        };
        assert_eq!(
            file.output_hint(&args(&["-o", "out.iso"])).as_deref(),
            Some("out.iso")
        );
        assert_eq!(Settings::default().output_hint(&args(&[])), None);
    }

    #[tokio::test]
    async fn test_missing_default_dir_is_created_as_directory() -> Result<()> {
        let tmp = tempdir()?;
        let downloads = tmp.path().join("Downloads");
        let file = Settings {
            default_dir: Some(downloads.to_string_lossy().to_string()),
            ..Default::default()
        };

        let hint = file.output_hint(&args(&[]));
        let client = ProbingClient::new(ClientOptions::default())?;
        let path = utils::resolve_output_path(
            &client,
            "http://example.invalid/big.iso",
            hint.as_deref(),
        )
        .await?;

        assert_eq!(path, downloads.join("big.iso"));
        assert!(downloads.is_dir());
        Ok(())
    }
}
