//! Process supervision for `rclone rcd`.
//!
//! The [`Supervisor`] owns at most one child process. Starting is fire and
//! forget: readiness is observed separately through the control protocol
//! (see [`crate::readiness`]). Stopping sends SIGTERM on Unix, waits for a
//! grace period and then kills.

mod error;
mod probe;
mod shutdown;
mod spawning;
mod state;
mod supervisor;

pub use self::error::LifecycleError;
pub use self::state::ServicePhase;
pub use self::supervisor::{Liveness, Supervisor};

/// Log target for lifecycle operations.
pub(crate) const LIFECYCLE_TARGET: &str = "rclone_client::lifecycle";
