//! quake-report: recent earthquakes from the USGS feed, in the terminal.

use std::path::PathBuf;

use clap::Parser;
use quake_report_lib::core::config::AppConfig;
use quake_report_lib::{CliOverrides, OrderBy, RunMode};

#[derive(Parser)]
#[command(
    name = "quake-report",
    about = "Lists recent earthquakes from the USGS feed and opens their detail pages",
    version
)]
struct Cli {
    /// Full feed URL. Overrides the query flags below.
    #[arg(long)]
    url: Option<String>,

    /// Read the feed from a local GeoJSON file instead of the network.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Smallest magnitude to request.
    #[arg(long)]
    min_magnitude: Option<f64>,

    /// Number of events to request.
    #[arg(long)]
    limit: Option<u32>,

    /// Sort order (time, time-asc, magnitude, magnitude-asc).
    #[arg(long)]
    order_by: Option<OrderBy>,

    /// Print the list once and exit.
    #[arg(long)]
    once: bool,

    /// With --once, print the events as JSON.
    #[arg(long, requires = "once")]
    json: bool,

    /// Show dates and times in UTC instead of local time.
    #[arg(long)]
    utc: bool,

    /// Log filter (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            url: self.url.clone(),
            fixture: self.fixture.clone(),
            min_magnitude: self.min_magnitude,
            limit: self.limit,
            order_by: self.order_by,
            log_level: self.log_level.clone(),
            utc: self.utc,
        }
    }

    fn mode(&self) -> RunMode {
        match (self.once, self.json) {
            (true, true) => RunMode::OnceJson,
            (true, false) => RunMode::Once,
            _ => RunMode::Interactive,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.overrides())?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    quake_report_lib::run(config, cli.mode()).await?;
    Ok(())
}
