//! Default values shared by the provisioning tool and the client.

use crate::endpoint::ServiceEndpoint;
use crate::logging::LogFormat;

/// Release installed when no version override is supplied.
pub const DEFAULT_RCLONE_VERSION: &str = "1.72.1";

/// Download server publishing versioned release directories.
pub const DEFAULT_RELEASE_BASE_URL: &str = "https://downloads.rclone.org";

/// Package root used when no output directory is configured.
pub const DEFAULT_OUT_DIR: &str = ".";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Host the remote-control server binds to by default.
pub const DEFAULT_SERVICE_HOST: &str = "localhost";

/// Port `rclone rcd` listens on when none is given.
pub const DEFAULT_SERVICE_PORT: u16 = 5572;

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Endpoint used when the caller does not configure one.
#[must_use]
pub fn default_service_endpoint() -> ServiceEndpoint {
    ServiceEndpoint::new(DEFAULT_SERVICE_HOST, DEFAULT_SERVICE_PORT)
}
