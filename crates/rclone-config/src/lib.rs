//! Shared configuration for the rclone provisioning tool and client.
//!
//! Provisioning settings are layered by [`ortho_config`]: defaults, an
//! optional configuration file, `BUILD_*` environment variables, and command
//! line flags, in increasing order of precedence. Every field is optional so
//! callers can tell an explicit override from a default; the accessor methods
//! apply the defaults from [`defaults`].
//!
//! The [`ServiceEndpoint`] type describes where a supervised `rclone rcd`
//! process listens for remote-control requests.

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub mod defaults;
mod endpoint;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_OUT_DIR, DEFAULT_RCLONE_VERSION, DEFAULT_RELEASE_BASE_URL,
    DEFAULT_SERVICE_HOST, DEFAULT_SERVICE_PORT, default_log_format, default_service_endpoint,
};
pub use endpoint::{EndpointParseError, ServiceEndpoint};
pub use logging::{LogFormat, LogFormatParseError};

/// Settings consumed by the provisioning entry point.
///
/// Environment variables use the `BUILD_` prefix, so `BUILD_RCLONE_VERSION`,
/// `BUILD_SYSTEM` and `BUILD_ARCH` override the release version and the
/// detected host platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "BUILD")]
pub struct ProvisionConfig {
    /// Release version to install, with or without a leading `v`.
    pub rclone_version: Option<String>,
    /// Operating system override; skips host detection when present.
    pub system: Option<String>,
    /// Architecture override; skips host detection when present.
    pub arch: Option<String>,
    /// Package root receiving the `bin/` directory.
    pub out_dir: Option<Utf8PathBuf>,
    /// Base URL of the release download server.
    pub base_url: Option<String>,
    /// `tracing` filter expression for the provisioning run.
    pub log_filter: Option<String>,
    /// Output format for log records.
    pub log_format: Option<LogFormat>,
}

impl ProvisionConfig {
    /// Release version to install.
    #[must_use]
    pub fn rclone_version(&self) -> &str {
        self.rclone_version
            .as_deref()
            .unwrap_or(DEFAULT_RCLONE_VERSION)
    }

    /// Explicit operating system override, if any.
    #[must_use]
    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    /// Explicit architecture override, if any.
    #[must_use]
    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    /// Package root receiving the installed binary.
    #[must_use]
    pub fn out_dir(&self) -> &Utf8Path {
        self.out_dir
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_OUT_DIR))
    }

    /// Directory the binary is installed into, `<out_dir>/bin`.
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.out_dir().join("bin")
    }

    /// Base URL of the release download server.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_RELEASE_BASE_URL)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }
}
