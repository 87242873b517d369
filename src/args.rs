use clap::Parser;

/// A multithreaded file downloader.
///
/// Splits files into byte ranges and downloads them in parallel when the
/// server supports it, falling back to a single stream when it does not.
#[derive(Parser, Debug)]
#[command(name = "threadracer", author, version, about, long_about = None)]
pub struct Args {
    /// The URL of the file to download.
    #[arg(short, long)]
    pub url: String,

    /// An HTTP header to send with every request (`Key: Value`). Repeatable.
    #[arg(short = 'H', long = "header", value_name = "KEY: VALUE")]
    pub headers: Vec<String>,

    /// A cookie to send with every request (`name=value`). Repeatable.
    #[arg(short = 'c', long = "cookie", value_name = "NAME=VALUE")]
    pub cookies: Vec<String>,

    /// Output filename or directory. Defaults to a name derived from the URL.
    #[arg(short, long)]
    pub output: Option<String>,

    /// The number of concurrent download threads to use. Defaults to 4.
    #[arg(short = 't', long, value_parser = clap::value_parser!(u8).range(1..))]
    pub threads: Option<u8>,

    /// How many times to restart a failed download. Defaults to 3.
    #[arg(short = 'r', long)]
    pub retries: Option<u32>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Do not print the start-up banner.
    #[arg(long)]
    pub no_banner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_args() {
        let args = Args::try_parse_from(["threadracer", "-u", "http://example.com/a.iso"]).unwrap();
        assert_eq!(args.url, "http://example.com/a.iso");
        assert!(args.headers.is_empty());
        assert!(args.cookies.is_empty());
        assert_eq!(args.threads, None);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_repeatable_headers_and_cookies() {
        let args = Args::try_parse_from([
            "threadracer",
            "--url",
            "http://example.com/a.iso",
            "-H",
            "Authorization: Bearer x",
            "-H",
            "Accept: */*",
            "-c",
            "session=1",
            "-o",
            "downloads/",
            "-t",
            "8",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.headers.len(), 2);
        assert_eq!(args.cookies, vec!["session=1".to_string()]);
        assert_eq!(args.output.as_deref(), Some("downloads/"));
        assert_eq!(args.threads, Some(8));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_url_is_required_and_threads_positive() {
        assert!(Args::try_parse_from(["threadracer"]).is_err());
        assert!(Args::try_parse_from(["threadracer", "-u", "http://x", "-t", "0"]).is_err());
    }
}
