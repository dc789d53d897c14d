use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use event_scout::config::ScoutConfig;
use event_scout::constants::GEOCODE_USER_AGENT;
use event_scout::error::ScraperError;
use event_scout::geocode::Geocoder;
use event_scout::infra::{build_client, ChromiumLauncher, HttpScoutApi};
use event_scout::logging;
use event_scout::metrics::init_metrics;
use event_scout::mission::{Mission, MissionOptions};

#[derive(Parser)]
#[command(name = "event_scout")]
#[command(about = "Crawls event listings and publishes them to the events API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Stop after the first parsed event without uploading anything
    #[arg(long)]
    dry_run: bool,

    /// Crawl only this URL instead of the configured targets
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging();

    let config = ScoutConfig::load()?;
    init_metrics(config.metrics_addr.as_deref());

    let client = build_client(GEOCODE_USER_AGENT, Duration::from_secs(30))?;
    let geocoder = Geocoder::with_default_chain(client.clone(), &config.nominatim_url, config.geocode_delay());
    let api = Arc::new(HttpScoutApi::new(client, &config.api_url, config.api_token.clone()));
    let launcher = ChromiumLauncher::new(config.headless, config.chrome_path.clone());

    let options = MissionOptions {
        dry_run: cli.dry_run,
        url_override: cli.url,
    };
    let mission = Mission::new(config, api, geocoder, options);

    match mission.run(&launcher).await {
        Ok(report) => {
            info!(
                "Mission {} {:?}: {} events uploaded, {} duplicates, {} upload failures",
                report.run_id, report.status, report.events_uploaded, report.duplicates, report.upload_failures
            );
            println!("\n📊 Mission {}:", report.run_id);
            println!("   Targets processed: {}", report.targets_processed);
            println!("   Candidates: {}", report.candidates_seen);
            println!("   Events parsed: {}", report.events_parsed);
            println!("   Uploaded: {}", report.events_uploaded);
            println!("   Duplicates: {}", report.duplicates);
            println!("   Errors: {}", report.errors.len());
            if let Some(preview) = &report.dry_run_preview {
                println!("\n🔎 Dry run preview:\n{}", serde_json::to_string_pretty(preview)?);
            }
            Ok(())
        }
        Err(ScraperError::Fatal(message)) => {
            error!("Mission failed: {}", message);
            eprintln!("❌ Mission failed: {}", message);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
