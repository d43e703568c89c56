//! Error types for supervisor lifecycle operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting or stopping the rclone server.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The executable is not installed at the configured path.
    #[error("rclone binary not found at {path:?}; provision it before starting the service")]
    BinaryMissing {
        /// Path that was checked.
        path: PathBuf,
    },
    /// Something already accepts connections on the endpoint.
    #[error(
        "remote-control endpoint {endpoint} is already in use; stop the other server or choose another port"
    )]
    EndpointInUse {
        /// Endpoint that answered.
        endpoint: String,
    },
    /// Probing the endpoint failed for a reason other than "nothing listening".
    #[error("failed to probe remote-control endpoint {endpoint}: {source}")]
    EndpointProbe {
        /// Endpoint that was probed.
        endpoint: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The operating system refused to start the process.
    #[error("failed to spawn rclone binary {binary:?}: {source}")]
    Spawn {
        /// Executable that was launched.
        binary: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Delivering the termination signal failed.
    #[error("failed to signal rclone pid {pid}: {source}")]
    Signal {
        /// Target process.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// Reaping the process failed.
    #[error("failed to wait for rclone pid {pid}: {source}")]
    Wait {
        /// Target process.
        pid: u32,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
