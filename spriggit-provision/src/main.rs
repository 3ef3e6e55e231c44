use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spriggit_provision::cli::Args;
use spriggit_provision::config::Config;
use spriggit_provision::provisioner::Provisioner;
use spriggit_provision::reporter::{Reporter, TracingReporter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.verbose {
        tracing::info!("Running spriggit-provision with verbose output");
    }

    let config_path = args.config_path();
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);
    let provisioner = Provisioner::with_defaults(&config.http, config.spriggit_layout(), reporter)
        .context("Failed to build HTTP client")?;

    provisioner.provision(&args.version).await;

    Ok(())
}
