use anyhow::{Context, Result};
use clap::Parser;
use kyctrust::config::AppConfig;
use kyctrust::server::ServerBuilder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// KYC Trust admin order service
#[derive(Debug, Parser)]
#[command(name = "kyctrust-admin", version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "KYCTRUST_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration
    #[arg(short, long)]
    bind: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env.local overrides .env; both are optional
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref()).context("invalid configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
        config.validate().context("invalid --bind")?;
    }

    tracing::info!(
        bind = %config.bind,
        admins = config.admins.len(),
        "starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    ServerBuilder::new(config).serve().await
}
