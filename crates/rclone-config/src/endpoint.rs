use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Address of the remote-control listener of a supervised `rclone rcd`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct ServiceEndpoint {
    host: String,
    port: u16,
}

impl ServiceEndpoint {
    /// Builds an endpoint from its parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or address, IPv6 literals keep their brackets.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host suitable for name resolution, with IPv6 brackets removed.
    #[must_use]
    pub fn resolvable_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .unwrap_or(&self.host)
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Value passed to `--rc-addr`, for example `localhost:5572`.
    #[must_use]
    pub fn rc_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL for remote-control requests, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServiceEndpoint {
    type Err = EndpointParseError;

    /// Accepts `host:port` as well as `tcp://host:port` and
    /// `http://host:port`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.contains("://") {
            return parse_url(input);
        }
        let (host, raw_port) = input
            .rsplit_once(':')
            .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
        if host.is_empty() {
            return Err(EndpointParseError::MissingHost(input.to_owned()));
        }
        let port = raw_port
            .parse::<u16>()
            .map_err(|_| EndpointParseError::InvalidPort(input.to_owned()))?;
        Ok(Self::new(host, port))
    }
}

fn parse_url(input: &str) -> Result<ServiceEndpoint, EndpointParseError> {
    let url = Url::parse(input)?;
    match url.scheme() {
        "tcp" | "http" => {
            let host = url
                .host_str()
                .ok_or_else(|| EndpointParseError::MissingHost(input.to_owned()))?;
            let port = url
                .port()
                .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
            Ok(ServiceEndpoint::new(host, port))
        }
        other => Err(EndpointParseError::UnsupportedScheme(other.to_owned())),
    }
}

/// Errors encountered while parsing a [`ServiceEndpoint`] from text.
#[derive(Debug, Error)]
pub enum EndpointParseError {
    /// Scheme was not recognised.
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    /// Host name was missing.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// Port was missing from the address.
    #[error("missing port in '{0}'")]
    MissingPort(String),
    /// Port was not a valid 16-bit number.
    #[error("invalid port in '{0}'")]
    InvalidPort(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
