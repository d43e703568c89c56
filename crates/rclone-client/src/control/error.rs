//! Errors raised by remote-control calls.

use thiserror::Error;

/// Failure of a single remote-control call.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The HTTP client could not be constructed.
    #[error("failed to build remote-control HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The endpoint does not form a valid URL.
    #[error("remote-control endpoint {endpoint} is not a valid URL authority: {source}")]
    InvalidEndpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// URL parse error.
        #[source]
        source: url::ParseError,
    },

    /// The server could not be reached or did not answer in time.
    #[error("remote-control call {path} failed to reach the server: {source}")]
    Communication {
        /// Control path, for example `core/version`.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server rejected the call.
    #[error("remote-control call {path} failed with HTTP {status}: {message}")]
    Protocol {
        /// Control path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Error text reported by the server.
        message: String,
    },

    /// The server answered with a body that does not match the call.
    #[error("remote-control call {path} returned a malformed response: {source}")]
    MalformedResponse {
        /// Control path.
        path: String,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// No backend with this name is configured.
    #[error("no backend named '{name}' is configured")]
    NotFound {
        /// Backend name.
        name: String,
    },

    /// A backend with this name is already configured.
    #[error("a backend named '{name}' is already configured")]
    AlreadyExists {
        /// Backend name.
        name: String,
    },

    /// The backend name would be rejected by rclone.
    #[error("invalid backend name '{name}': {reason}")]
    InvalidName {
        /// Rejected name.
        name: String,
        /// Rule that was violated.
        reason: &'static str,
    },
}

impl ControlError {
    /// Whether the server was unreachable, as opposed to answering badly.
    #[must_use]
    pub const fn is_communication(&self) -> bool {
        matches!(self, Self::Communication { .. })
    }

    /// Whether the call was refused at the protocol level.
    ///
    /// Covers server-side rejections as well as the client-side name and
    /// existence checks that stand in for them.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::Protocol { .. }
                | Self::MalformedResponse { .. }
                | Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::InvalidName { .. }
        )
    }
}
