//! Artifact download over plain HTTP(S) GET.
//!
//! Provides a trait-based abstraction over the HTTP client so that the
//! synchroniser can be exercised without network access. Redirects are
//! never followed: a redirect response is a download failure, since a
//! moved resource means the manifest URL is stale.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout for resource downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for fetching the bytes behind a manifest `src` URL.
#[cfg_attr(test, mockall::automock)]
pub trait Downloader {
    /// Download `url` and return the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server responds with an
    /// error status, or the response is a redirect.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Errors arising from resource downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("resource not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The server answered with a redirect, which the tool refuses to
    /// follow.
    #[error("redirect response ({status}) for {url}")]
    Redirected {
        /// The URL that was requested.
        url: String,
        /// The 3xx status code received.
        status: u16,
    },
}

/// HTTP-based downloader using `ureq` with redirect-following disabled.
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        log::debug!("fetching {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;

        let status = response.status();
        if status.is_redirection() {
            return Err(DownloadError::Redirected {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let mut bytes = Vec::new();
        response
            .into_body()
            .as_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }
}

/// Shared `ureq` agent with timeouts set and redirects disabled.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .max_redirects(0)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(status) if (300..400).contains(status) => {
            DownloadError::Redirected {
                url: url.to_owned(),
                status: *status,
            }
        }
        ureq::Error::TooManyRedirects => DownloadError::Redirected {
            url: url.to_owned(),
            status: 302,
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
