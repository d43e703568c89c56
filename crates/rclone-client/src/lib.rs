//! Supervision and remote control of a local `rclone rcd` server.
//!
//! [`RcloneClient`] launches the provisioned executable in remote-control
//! mode bound to a loopback endpoint, observes its readiness through the
//! control protocol, issues control calls (version query, backend
//! configuration create and delete) and terminates it on request.
//!
//! `start()` is fire and forget. Callers that need the server to answer
//! either poll [`RcloneClient::operational`] themselves or use
//! [`RcloneClient::wait_until_operational`] with a [`ReadinessPolicy`].
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! use rclone_client::{RcloneClient, ReadinessPolicy};
//! use rclone_config::ServiceEndpoint;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RcloneClient::for_package(
//!     ServiceEndpoint::new("localhost", 5573),
//!     Path::new("package"),
//! )?;
//! client.start()?;
//! client.wait_until_operational(&ReadinessPolicy::default(), None)?;
//! client.config_create("scratch", "local", &BTreeMap::new())?;
//! client.config_delete("scratch")?;
//! client.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod client;
pub mod control;
pub mod lifecycle;
pub mod options;
pub mod readiness;

pub use binary::{BIN_DIR, InstalledBinary, binary_name};
pub use client::RcloneClient;
pub use control::{BackendConfig, ControlClient, ControlError, VersionInfo};
pub use lifecycle::{LifecycleError, Liveness, ServicePhase, Supervisor};
pub use options::{
    ClientOptions, DEFAULT_PROBE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SHUTDOWN_GRACE,
};
pub use readiness::{CancelToken, ReadinessError, ReadinessPolicy};
