use anyhow::{Context, Result};
use forex_tracker::config::Settings;
use forex_tracker::server;
use forex_tracker::store::RateStore;
use forex_tracker::view::RatesView;
use log::info;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env()?;
    let store = RateStore::open_read_only(&settings.database_path);
    let view = RatesView::new(store);

    info!(
        "Serving rates from {} on http://{}",
        settings.database_path.display(),
        settings.viewer_addr
    );
    server::run(&settings.viewer_addr, view)
        .await
        .with_context(|| format!("Viewer failed on {}", settings.viewer_addr))?;

    Ok(())
}
