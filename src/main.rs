//! gecko-harvest - Resumable CoinGecko market + metadata harvester

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use gecko_harvest::adapters::cli::{self, CliApp};
use gecko_harvest::config::load_or_default;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (COINGECKO_API_URL etc.)
    dotenvy::dotenv().ok();

    let app = cli::init();
    init_logging(&app)?;

    cli::execute(app).await
}

fn init_logging(app: &CliApp) -> Result<()> {
    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if app.debug {
        EnvFilter::new("debug")
    } else if app.verbose {
        EnvFilter::new("info")
    } else {
        let config = load_or_default(app.config.as_deref())
            .context("Failed to load configuration")?;
        EnvFilter::try_new(&config.logging.level)
            .with_context(|| format!("Invalid log level '{}'", config.logging.level))?
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}
