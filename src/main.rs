use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use forex_tracker::config::Settings;
use forex_tracker::fetch::Fetcher;
use forex_tracker::ingest::Pipeline;
use forex_tracker::store::RateStore;
use log::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => {
            info!("Scraping completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Scraping failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    info!("Starting forex rate scraper at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let settings = Settings::from_env()?;
    let store = RateStore::open(&settings.database_path)
        .await
        .with_context(|| format!("Can't open database {}", settings.database_path.display()))?;
    info!("Database initialized at {}", settings.database_path.display());

    let fetcher = Fetcher::new(&settings.source)?;
    let layout = settings.layout();

    let report = Pipeline::new(&fetcher, &layout, &store).run().await?;
    info!(
        "Run for {}: {} stored, {} failed, {} rows skipped",
        report.date, report.stored, report.failed, report.skipped
    );

    Ok(())
}
