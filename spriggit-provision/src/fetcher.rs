use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;

use crate::config::HttpConfig;
use crate::error::FetchError;
use crate::provisioner::Download;
use crate::reporter::{Reporter, TracingReporter};

/// Downloads a single URL to a file on disk.
pub struct Fetcher {
    client: Client,
    reporter: Arc<dyn Reporter>,
}

impl Fetcher {
    pub fn new(client: Client, reporter: Arc<dyn Reporter>) -> Self {
        Self { client, reporter }
    }

    /// Build a fetcher whose client follows the HTTP settings from the config file.
    pub fn from_config(http: &HttpConfig, reporter: Arc<dyn Reporter>) -> reqwest::Result<Self> {
        let mut builder = Client::builder().user_agent(http.user_agent.as_str());
        if let Some(timeout) = http.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::new(builder.build()?, reporter))
    }

    /// GET `url` and write the whole body to `destination`.
    ///
    /// Redirects are followed by the client. The body is buffered in memory
    /// and written once the response has completed, so nothing touches the
    /// filesystem when the transfer fails.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        self.reporter.info(&format!("Downloading file at url {url}"));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            self.reporter
                .warn(&format!("Server responded with status {status} for {url}"));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| FetchError::ConnectionFailed {
                url: url.to_string(),
                source,
            })?;
            body.extend_from_slice(&chunk);
        }

        ensure_parent_dir(destination)
            .await
            .map_err(|source| FetchError::Write {
                path: destination.to_path_buf(),
                source,
            })?;

        tokio::fs::write(destination, &body)
            .await
            .map_err(|source| FetchError::Write {
                path: destination.to_path_buf(),
                source,
            })?;

        tracing::debug!("Wrote {} bytes to {}", body.len(), destination.display());
        Ok(())
    }

    /// Like [`Fetcher::fetch`], but failures are reported and then dropped.
    ///
    /// Callers must not assume `destination` exists afterwards.
    pub async fn download_to(&self, url: &str, destination: &Path) {
        if let Err(e) = self.fetch(url, destination).await {
            self.reporter.error(
                &format!("Attempted to download a file at {url} but the download failed: "),
                &e,
            );
        }
    }
}

impl Download for Fetcher {
    async fn download(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        // Failures are swallowed here, so the provisioner always sees success.
        self.download_to(url, destination).await;
        Ok(())
    }
}

/// Download `url` to `destination` with a default client, logging instead of
/// returning any failure.
pub async fn download_file_to_destination(url: &str, destination: &Path) {
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);

    match Fetcher::from_config(&HttpConfig::default(), reporter.clone()) {
        Ok(fetcher) => fetcher.download_to(url, destination).await,
        Err(source) => {
            let e = FetchError::RequestFailed {
                url: url.to_string(),
                source,
            };
            reporter.error(
                &format!("Attempted to download a file at {url} but the download failed: "),
                &e,
            );
        }
    }
}

/// Errors raised while reaching the server are connection failures; anything
/// else that stops the request from being issued is a request failure.
fn classify_send_error(url: &str, source: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if source.is_connect() || source.is_timeout() {
        FetchError::ConnectionFailed { url, source }
    } else {
        FetchError::RequestFailed { url, source }
    }
}

/// Create the parent directory of `path` if it is missing.
///
/// Returns whether a directory was created.
async fn ensure_parent_dir(path: &Path) -> std::io::Result<bool> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(false);
    };

    if tokio::fs::try_exists(parent).await? {
        return Ok(false);
    }

    tokio::fs::create_dir_all(parent).await?;
    Ok(true)
}
