use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use smartfarm::{
    advisor::AdvisorConfig,
    config::{FarmConfig, FarmConfigLoader},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Smart Farm: a browser farming sim with an AI advisor")]
struct Cli {
    /// Path to the farm YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interface to bind the web UI on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for the web UI
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Override the weather seed
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut farm = match &cli.config {
        Some(path) => FarmConfigLoader::new(".").load(path)?,
        None => FarmConfig::default(),
    };
    if cli.seed.is_some() {
        farm.seed = cli.seed;
    }
    info!(farm = farm.display_name(), seed = ?farm.seed, "loaded farm config");

    let advisor = AdvisorConfig::from_env(&farm.advisor);
    web::run(WebServerConfig {
        farm,
        advisor,
        host: cli.host,
        port: cli.port,
    })
    .await
}
