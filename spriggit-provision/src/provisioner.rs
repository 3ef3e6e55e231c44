use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::HttpConfig;
use crate::error::{ExtractError, FetchError, ProvisionError, Result};
use crate::extractor::Extractor;
use crate::fetcher::Fetcher;
use crate::reporter::{Reporter, TracingReporter};

pub const RELEASE_BASE_URL: &str = "https://github.com/Mutagen-Modding/Spriggit/releases/download";
pub const ARCHIVE_NAME: &str = "SpriggitLinuxCLI.zip";
pub const EXTRACT_DIR: &str = "spriggit";
pub const CLI_NAME: &str = "Spriggit.CLI";

/// rwxr-xr-x
pub const CLI_MODE: u32 = 0o755;

/// Download stage of the pipeline.
#[allow(async_fn_in_trait)]
pub trait Download {
    async fn download(&self, url: &str, destination: &Path) -> std::result::Result<(), FetchError>;
}

/// Extraction stage of the pipeline.
#[allow(async_fn_in_trait)]
pub trait Unpack {
    async fn unpack(
        &self,
        archive: &Path,
        destination: &Path,
    ) -> std::result::Result<(), ExtractError>;
}

/// Permission fix-up applied to the extracted CLI.
pub trait SetMode {
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// Sets permission bits on the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPermissions;

impl SetMode for HostPermissions {
    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, _path: &Path, _mode: u32) -> io::Result<()> {
        // No-op on Windows
        Ok(())
    }
}

/// Where the archive, the extracted tree and the CLI live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriggitLayout {
    pub archive_path: PathBuf,
    pub extract_dir: PathBuf,
    pub cli_path: PathBuf,
}

impl Default for SpriggitLayout {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from(ARCHIVE_NAME),
            extract_dir: PathBuf::from(EXTRACT_DIR),
            cli_path: Path::new(EXTRACT_DIR).join(CLI_NAME),
        }
    }
}

/// Everything derived for one provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisioningContext {
    pub version: String,
    pub url: String,
    pub layout: SpriggitLayout,
}

impl ProvisioningContext {
    /// The version is inserted into the URL verbatim; it never changes the local layout.
    pub fn new(version: &str, layout: &SpriggitLayout) -> Self {
        Self {
            version: version.to_string(),
            url: release_url(version),
            layout: layout.clone(),
        }
    }
}

pub fn release_url(version: &str) -> String {
    format!("{RELEASE_BASE_URL}/{version}/{ARCHIVE_NAME}")
}

/// Runs download, extraction and the permission fix-up for one release.
pub struct Provisioner<D, U, P> {
    downloader: D,
    unpacker: U,
    permissions: P,
    layout: SpriggitLayout,
    reporter: Arc<dyn Reporter>,
}

impl<D, U, P> Provisioner<D, U, P>
where
    D: Download,
    U: Unpack,
    P: SetMode,
{
    pub fn new(
        downloader: D,
        unpacker: U,
        permissions: P,
        layout: SpriggitLayout,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            downloader,
            unpacker,
            permissions,
            layout,
            reporter,
        }
    }

    /// Provision `version`. Never fails: any stage error is reported and the
    /// call returns normally.
    pub async fn provision(&self, version: &str) {
        let context = ProvisioningContext::new(version, &self.layout);

        if let Err(e) = self.try_provision(&context).await {
            self.reporter
                .error("There was an error downloading Spriggit", &e);
        }
    }

    async fn try_provision(&self, context: &ProvisioningContext) -> Result<()> {
        let layout = &context.layout;

        self.reporter.info(&format!(
            "Downloading Spriggit {} to {}",
            context.version,
            layout.archive_path.display()
        ));
        self.downloader
            .download(&context.url, &layout.archive_path)
            .await
            .map_err(ProvisionError::Download)?;
        self.reporter
            .info(&format!("Successfully downloaded Spriggit {}", context.version));

        self.reporter.info(&format!(
            "Extracting spriggit to {}",
            layout.extract_dir.display()
        ));
        self.unpacker
            .unpack(&layout.archive_path, &layout.extract_dir)
            .await
            .map_err(ProvisionError::Extract)?;
        self.reporter.info("Spriggit extracted successfully");

        self.reporter.info(&format!(
            "Giving +x permission to {}",
            layout.cli_path.display()
        ));
        self.permissions
            .set_mode(&layout.cli_path, CLI_MODE)
            .map_err(|source| ProvisionError::Permissions {
                path: layout.cli_path.clone(),
                source,
            })?;

        Ok(())
    }
}

impl Provisioner<Fetcher, Extractor, HostPermissions> {
    /// The real pipeline: network fetch, archive extraction and host chmod.
    pub fn with_defaults(
        http: &HttpConfig,
        layout: SpriggitLayout,
        reporter: Arc<dyn Reporter>,
    ) -> reqwest::Result<Self> {
        let fetcher = Fetcher::from_config(http, reporter.clone())?;
        let extractor = Extractor::new(reporter.clone());

        Ok(Self::new(fetcher, extractor, HostPermissions, layout, reporter))
    }
}

/// Download, extract and mark the Spriggit CLI executable for `version`,
/// using the default local layout. Failures are only logged.
pub async fn download_spriggit(version: &str) {
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);

    let provisioner = Provisioner::with_defaults(
        &HttpConfig::default(),
        SpriggitLayout::default(),
        reporter.clone(),
    );

    match provisioner {
        Ok(provisioner) => provisioner.provision(version).await,
        Err(source) => {
            let e = ProvisionError::Download(FetchError::RequestFailed {
                url: release_url(version),
                source,
            });
            reporter.error("There was an error downloading Spriggit", &e);
        }
    }
}
