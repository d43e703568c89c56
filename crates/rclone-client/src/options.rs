//! Settings for a supervised rclone server and its control client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rclone_config::{ServiceEndpoint, default_service_endpoint};

use crate::binary::InstalledBinary;

/// Default per-request timeout for control calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default timeout of the liveness probe behind `operational()`.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
/// Default time a server gets to exit after SIGTERM before it is killed.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Everything needed to launch and talk to one `rclone rcd` instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    endpoint: ServiceEndpoint,
    binary: InstalledBinary,
    config_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    inherit_output: bool,
    check_endpoint: bool,
    request_timeout: Duration,
    probe_timeout: Duration,
    shutdown_grace: Duration,
}

impl ClientOptions {
    /// Options for `binary` listening on `endpoint`, with default timeouts.
    #[must_use]
    pub const fn new(endpoint: ServiceEndpoint, binary: InstalledBinary) -> Self {
        Self {
            endpoint,
            binary,
            config_file: None,
            log_file: None,
            inherit_output: false,
            check_endpoint: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Options for `binary` on the default endpoint, `localhost:5572`.
    #[must_use]
    pub fn local(binary: InstalledBinary) -> Self {
        Self::new(default_service_endpoint(), binary)
    }

    /// Passes `--config <path>` to the server.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Passes `--log-file <path>` to the server.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Lets the server write to this process's stdout and stderr.
    #[must_use]
    pub const fn with_inherited_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    /// Enables or disables the "endpoint already in use" check on start.
    #[must_use]
    pub const fn with_endpoint_check(mut self, enabled: bool) -> Self {
        self.check_endpoint = enabled;
        self
    }

    /// Overrides the per-request timeout for control calls.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides the liveness probe timeout.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Overrides the SIGTERM grace period.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Remote-control endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Executable to launch.
    #[must_use]
    pub const fn binary(&self) -> &InstalledBinary {
        &self.binary
    }

    /// rclone configuration file, if any.
    #[must_use]
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// rclone log file, if any.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Whether the server inherits standard streams.
    #[must_use]
    pub const fn inherit_output(&self) -> bool {
        self.inherit_output
    }

    /// Whether start refuses a reachable endpoint.
    #[must_use]
    pub const fn check_endpoint(&self) -> bool {
        self.check_endpoint
    }

    /// Per-request timeout for control calls.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Liveness probe timeout.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// SIGTERM grace period.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }
}
