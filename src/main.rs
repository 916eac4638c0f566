use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use catalog_scraper::config::Config;
use catalog_scraper::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_PAGES, ENV_CREDS_PATH, ENV_DATABASE_URL, ENV_SPREADSHEET_ID,
};
use catalog_scraper::extract::FashionStudioCrawler;
use catalog_scraper::load::{build_sinks, SinkSelection};
use catalog_scraper::pipeline::Pipeline;
use catalog_scraper::transform::TransformConfig;
use catalog_scraper::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "catalog_scraper")]
#[command(about = "Scrape the Fashion Studio catalog and load clean product listings")]
#[command(version)]
struct Cli {
    /// Number of catalog pages to fetch
    #[arg(long, default_value_t = DEFAULT_PAGES)]
    pages: u32,

    /// CSV output path [default: products.csv]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Google Sheets spreadsheet ID (falls back to SPREADSHEET_ID)
    #[arg(long)]
    spreadsheet: Option<String>,

    /// Path to the Google service account JSON, CREDS_PATH overrides it [default: google-sheets-api.json]
    #[arg(long)]
    creds: Option<PathBuf>,

    /// Also replace a Postgres table; the connection string comes from DATABASE_URL
    #[arg(long)]
    postgres: bool,

    /// Postgres table to replace [default: products]
    #[arg(long = "postgres-table", alias = "postgres_table")]
    postgres_table: Option<String>,

    /// Optional TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Source-to-target currency rate (overrides the config file)
    #[arg(long)]
    exchange_rate: Option<u32>,

    /// Delay between page requests in milliseconds (overrides the config file)
    #[arg(long)]
    delay_ms: Option<u64>,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(rate) = cli.exchange_rate {
        config.transform.exchange_rate = rate;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.extract.delay_ms = delay_ms;
    }
    config.validate()?;

    let selection = SinkSelection {
        output: cli.output.unwrap_or_else(|| PathBuf::from(&config.load.output)),
        spreadsheet_id: cli.spreadsheet.or_else(|| env_nonempty(ENV_SPREADSHEET_ID)),
        credentials: env_nonempty(ENV_CREDS_PATH)
            .map(PathBuf::from)
            .or(cli.creds)
            .unwrap_or_else(|| PathBuf::from(&config.load.credentials)),
        sheet_range: config.load.sheet_range.clone(),
        postgres_table: cli
            .postgres
            .then(|| cli.postgres_table.unwrap_or_else(|| config.load.table.clone())),
        database_url: env_nonempty(ENV_DATABASE_URL),
    };

    let crawler = FashionStudioCrawler::new(
        config.extract.base_url.clone(),
        config.extract.timeout(),
        &config.extract.user_agent,
    )?;

    let pipeline = Pipeline::new(Box::new(crawler), build_sinks(&selection))
        .pages(cli.pages)
        .delay(config.extract.delay())
        .transform_config(TransformConfig::from(&config.transform));

    match pipeline.run().await {
        Ok(report) => {
            info!(
                raw = report.raw_records,
                clean = report.clean_records(),
                "Run complete"
            );
            for failed in report.failed_sinks() {
                info!(sink = failed.sink, "Sink did not complete");
            }
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
