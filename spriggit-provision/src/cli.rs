use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "spriggit-provision",
    version,
    about = "Download and prepare the Spriggit CLI from GitHub Releases",
    long_about = None
)]
pub struct Args {
    /// Release tag to download, used verbatim in the download URL
    /// Examples: v0.38.0, 0.35.1
    #[clap(id = "release_version", value_name = "VERSION", env = "SPRIGGIT_VERSION")]
    pub version: String,

    /// Configuration file path
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[clap(long)]
    pub verbose: bool,
}

impl Args {
    /// Configuration file to load, falling back to the user config directory
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Default log filter directive when `RUST_LOG` is unset
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
