//! Network access for release downloads.
//!
//! The [`ReleaseFetcher`] trait is the single seam through which the
//! provisioner touches the network, so tests can count or script requests
//! without a server.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

const FETCH_TARGET: &str = "rclone_provision::fetch";

/// Default time allowed for a single download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Retrieves the full body of a URL.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseFetcher {
    /// Performs a GET and returns the whole response body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failures and non-success statuses.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

impl<T: ReleaseFetcher + ?Sized> ReleaseFetcher for &T {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Errors raised while downloading a release file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server responded with HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}

/// Blocking HTTPS fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with [`DEFAULT_FETCH_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Builds a fetcher with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rclone-provision/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ReleaseFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        debug!(target: FETCH_TARGET, url = %url, "requesting release file");
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.bytes()?;
        debug!(target: FETCH_TARGET, url = %url, bytes = body.len(), "release file received");
        Ok(body.to_vec())
    }
}
