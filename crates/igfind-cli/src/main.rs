mod bulk;
mod find;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use igfind_core::AppConfig;
use igfind_finder::Finder;
use igfind_search::RateLimitCooldown;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "igfind")]
#[command(about = "Find the Instagram handle of restaurant locations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up a single location.
    Find(FindArgs),
    /// Process a CSV of locations and write CSV and JSON results.
    Bulk(BulkArgs),
}

#[derive(Debug, Args)]
struct FindArgs {
    /// Restaurant name as it appears on the storefront.
    name: String,
    /// Street address, e.g. "123 Main St, Boston, MA 02115".
    address: String,
    #[arg(long)]
    phone: Option<String>,
    /// Print the full result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct BulkArgs {
    /// Input CSV with BUSINESS_ID, STORE_ID, RESTAURANT NAME and ADDRESS columns.
    input: PathBuf,
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,
    /// Overrides IGFIND_BULK_MAX_WORKERS.
    #[arg(long)]
    workers: Option<usize>,
    /// Overrides IGFIND_STARTS_PER_SEC; 0 disables the start throttle.
    #[arg(long)]
    starts_per_sec: Option<f64>,
    /// Process rows in random order to spread out bursts from one brand.
    #[arg(long)]
    shuffle: bool,
    /// Only process the first N rows.
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = igfind_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let finder = build_finder(&config)?;
    match cli.command {
        Commands::Find(args) => find::run_find(&finder, args).await,
        Commands::Bulk(args) => bulk::run_bulk(finder, &config, args).await,
    }
}

fn build_finder(config: &AppConfig) -> anyhow::Result<Finder> {
    let scoring = igfind_core::load_scoring_config_or_default(&config.scoring_path)?;
    let cooldown = RateLimitCooldown::new(Duration::from_secs(config.rate_limit_cooldown_secs))
        .with_max_duration(Duration::from_secs(config.rate_limit_max_cooldown_secs));
    if !config.llm_available() {
        tracing::warn!("no LLM credentials configured; GPT search, Firecrawl and AI verification are off");
    }
    Ok(Finder::from_config(config, scoring, cooldown)?)
}

#[cfg(test)]
mod tests;
