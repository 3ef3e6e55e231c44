use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single download.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("connection to {url} failed: {source}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while unpacking an archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unsupported archive format: {file}. Supported formats: .zip, .tar, .tar.gz, .tgz, .tar.xz, .tar.bz2")]
    UnsupportedFormat { file: String },

    #[error("Extraction task did not complete: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

/// Failure of one provisioning stage, as seen by the provisioner.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("download failed: {0}")]
    Download(#[source] FetchError),

    #[error("extraction failed: {0}")]
    Extract(#[source] ExtractError),

    #[error("failed to set permissions on {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
