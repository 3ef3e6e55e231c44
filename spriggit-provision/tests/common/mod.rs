//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use spriggit_provision::error::FetchError;
use spriggit_provision::fetcher::Fetcher;
use spriggit_provision::provisioner::{Download, SpriggitLayout, RELEASE_BASE_URL};
use spriggit_provision::reporter::Reporter;
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Info(String),
    Warn(String),
    Error { message: String, cause: String },
}

/// Reporter that keeps every line it receives.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Info(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Warn(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error { message, cause } => Some((message, cause)),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn info(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Warn(message.to_string()));
    }

    fn error(&self, message: &str, cause: &(dyn Error + 'static)) {
        self.events.lock().unwrap().push(Event::Error {
            message: message.to_string(),
            cause: cause.to_string(),
        });
    }
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    format!("http://{addr}")
}

/// A local URL nothing is listening on.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{addr}/SpriggitLinuxCLI.zip")
}

/// Write a zip archive with the given `(name, contents, mode)` entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8], u32)]) {
    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());

    for (name, contents, mode) in entries {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(*mode);
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents).unwrap();
    }

    zip.finish().unwrap();
}

/// Build an in-memory zip archive with the given entries.
pub fn zip_bytes(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archive.zip");
    write_zip(&path, entries);
    fs::read(path).unwrap()
}

/// Layout rooted in a temporary directory, mirroring the default names.
pub fn layout_in(root: &Path) -> SpriggitLayout {
    SpriggitLayout {
        archive_path: root.join("SpriggitLinuxCLI.zip"),
        extract_dir: root.join("spriggit"),
        cli_path: root.join("spriggit").join("Spriggit.CLI"),
    }
}

/// Points release downloads at a local server instead of GitHub.
pub struct Mirror {
    pub fetcher: Fetcher,
    pub base: String,
    pub requested: Mutex<Vec<String>>,
}

impl Mirror {
    pub fn new(fetcher: Fetcher, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base: base.into(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Download for Mirror {
    async fn download(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        let local = url.replacen(RELEASE_BASE_URL, &self.base, 1);
        self.fetcher.download(&local, destination).await
    }
}
