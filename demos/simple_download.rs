use std::time::Duration;
use threadracer::{ClientOptions, Downloader, ProbingClient, RetryPolicy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration
    let url = "https://proof.ovh.net/files/10Mb.dat";
    let threads = 4;
    let output_dir = "./";

    threadracer::logging::init(1)?;

    println!("Starting example download...");
    println!("URL: {}", url);

    // 1. Setup the probing client (one connection pool for every request)
    let client = ProbingClient::new(ClientOptions {
        user_agent: "threadracer-example/0.1".to_string(),
        ..Default::default()
    })?;

    // 2. Check what the server offers
    let capability = client.probe_capability(url).await?;
    println!(
        "Size: {} bytes, ranges supported: {}",
        capability.total_size, capability.supports_ranges
    );

    // 3. Download with a short, quickly growing backoff
    let retry = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(500),
        growth_factor: 2.0,
        max_delay: Duration::from_secs(4),
    };
    let downloader = Downloader::new(client, threads, retry);
    let path = downloader.download(url, Some(output_dir)).await?;

    println!("✅ Download completed successfully: {}", path.display());
    Ok(())
}
