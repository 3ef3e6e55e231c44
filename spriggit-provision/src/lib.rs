//! # spriggit-provision
//!
//! Makes sure the Spriggit CLI is present on disk before a larger tool runs.
//!
//! ## Overview
//!
//! Provisioning is a three-stage pipeline:
//!
//! 1. download `SpriggitLinuxCLI.zip` for a release tag from GitHub,
//! 2. extract it into `./spriggit`,
//! 3. mark `./spriggit/Spriggit.CLI` as executable (mode 755).
//!
//! Each stage is usable on its own through [`download_file_to_destination`],
//! [`unzip_file`] and [`download_spriggit`]. Provisioning is best-effort: a
//! failing stage is logged and the call still returns normally.
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run() {
//! spriggit_provision::download_spriggit("v0.38.0").await;
//! # }
//! ```
//!
//! ## Configuration
//!
//! The binary reads an optional `spriggit-provision.toml` from the user
//! configuration directory for HTTP client settings and the local layout.

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Configuration file handling
pub mod config;

/// Error types for each pipeline stage
pub mod error;

/// Archive extraction
pub mod extractor;

/// HTTP(S) download to a local file
pub mod fetcher;

/// Orchestration of download, extraction and the permission fix-up
pub mod provisioner;

/// Injectable sink for status and error lines
pub mod reporter;

pub use extractor::unzip_file;
pub use fetcher::download_file_to_destination;
pub use provisioner::download_spriggit;
