//! Tracing subscriber setup for the binary.
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter directive for a `-v` count, used when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,threadracer=info",
        1 => "warn,threadracer=debug",
        2 => "info,threadracer=trace",
        _ => "trace",
    }
}

/// Installs a stderr fmt subscriber. `RUST_LOG` overrides `verbosity`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init(verbosity: u8) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_directives_parse() {
        for v in 0..5 {
            assert!(default_directive(v).parse::<EnvFilter>().is_ok());
        }
        assert_eq!(default_directive(0), "warn,threadracer=info");
        assert_eq!(default_directive(9), "trace");
    }
}
