use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;
use threadracer::config::Settings;
use threadracer::{Args, logging};
use tracing::{error, info, warn};

const BANNER: &str = r"
  ________                        ______
 /_  __/ /_  ________  ____ _____/ / __ \____ _________  _____
  / / / __ \/ ___/ _ \/ __ `/ __  / /_/ / __ `/ ___/ _ \/ ___/
 / / / / / / /  /  __/ /_/ / /_/ / _, _/ /_/ / /__/  __/ /
/_/ /_/ /_/_/   \___/\__,_/\__,_/_/ |_|\__,_/\___/\___/_/
";

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.set_message("Downloading...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if !args.no_banner {
        println!("{}", BANNER);
    }

    if let Err(e) = logging::init(args.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let settings = Settings::load().unwrap_or_else(|e| {
        warn!("Ignoring settings file: {:#}", e);
        Settings::default()
    });

    info!("Threadracer started");

    let downloader = match settings.build_downloader(&args) {
        Ok(d) => d,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = settings.output_hint(&args);

    let pb = spinner();
    let result = downloader.download(&args.url, output.as_deref()).await;
    pb.finish_and_clear();

    match result {
        Ok(path) => {
            println!("Saved to {}", path.display());
            info!("Threadracer finished");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_http() => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("An unexpected error occurred: {}", e);
            eprintln!("An unexpected error occurred: {}", e);
            ExitCode::FAILURE
        }
    }
}
