use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::provisioner::{SpriggitLayout, ARCHIVE_NAME, CLI_NAME, EXTRACT_DIR};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds. Unset means the client never times out.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(default = "default_archive_path")]
    pub archive_path: PathBuf,

    #[serde(default = "default_extract_dir")]
    pub extract_dir: PathBuf,

    #[serde(default = "default_cli_path")]
    pub cli_path: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            archive_path: default_archive_path(),
            extract_dir: default_extract_dir(),
            cli_path: default_cli_path(),
        }
    }
}

impl From<&LayoutConfig> for SpriggitLayout {
    fn from(layout: &LayoutConfig) -> Self {
        SpriggitLayout {
            archive_path: layout.archive_path.clone(),
            extract_dir: layout.extract_dir.clone(),
            cli_path: layout.cli_path.clone(),
        }
    }
}

fn default_user_agent() -> String {
    "spriggit-provision".to_string()
}

fn default_archive_path() -> PathBuf {
    PathBuf::from(ARCHIVE_NAME)
}

fn default_extract_dir() -> PathBuf {
    PathBuf::from(EXTRACT_DIR)
}

fn default_cli_path() -> PathBuf {
    Path::new(EXTRACT_DIR).join(CLI_NAME)
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("spriggit-provision.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/spriggit-provision.toml"))
    }

    pub fn spriggit_layout(&self) -> SpriggitLayout {
        SpriggitLayout::from(&self.layout)
    }
}
