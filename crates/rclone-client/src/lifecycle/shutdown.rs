//! Terminating the supervised process.
//!
//! On Unix the server first receives SIGTERM so it can close its listener,
//! then gets killed if it is still alive after the grace period. Other
//! platforms kill it directly.

use std::io;
use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;

#[cfg(unix)]
use libc::{SIGTERM, kill};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Sends SIGTERM to `pid`.
///
/// # Errors
///
/// Returns [`LifecycleError::Signal`] when `kill(2)` fails, for example
/// because the process has already been reaped.
#[cfg(unix)]
pub(crate) fn signal_terminate(pid: u32) -> Result<(), LifecycleError> {
    let raw_pid = libc::pid_t::try_from(pid).map_err(|_| LifecycleError::Signal {
        pid,
        source: io::Error::from(io::ErrorKind::InvalidInput),
    })?;
    // SAFETY: `kill(2)` is memory-safe even when the PID is invalid; the
    // kernel simply returns an error. The PID belongs to a child we still hold,
    // so it has not been recycled.
    let result = unsafe { kill(raw_pid, SIGTERM) };
    if result == 0 {
        Ok(())
    } else {
        Err(LifecycleError::Signal {
            pid,
            source: io::Error::last_os_error(),
        })
    }
}

/// Stops `child`, escalating to a kill after `grace`.
///
/// The child is always reaped before this returns successfully.
pub(crate) fn terminate(child: &mut Child, grace: Duration) -> Result<(), LifecycleError> {
    let pid = child.id();
    if let Some(status) = child
        .try_wait()
        .map_err(|source| LifecycleError::Wait { pid, source })?
    {
        debug!(target: LIFECYCLE_TARGET, pid, ?status, "rclone had already exited");
        return Ok(());
    }

    if request_exit(pid) && wait_for_exit(child, grace)? {
        return Ok(());
    }

    warn!(
        target: LIFECYCLE_TARGET,
        pid,
        ?grace,
        "rclone did not exit gracefully, killing"
    );
    match child.kill() {
        Ok(()) => {}
        // Exited between the last poll and the kill.
        Err(error) if error.kind() == io::ErrorKind::InvalidInput => {}
        Err(source) => return Err(LifecycleError::Wait { pid, source }),
    }
    let status = child
        .wait()
        .map_err(|source| LifecycleError::Wait { pid, source })?;
    debug!(target: LIFECYCLE_TARGET, pid, ?status, "rclone killed");
    Ok(())
}

#[cfg(unix)]
fn request_exit(pid: u32) -> bool {
    match signal_terminate(pid) {
        Ok(()) => true,
        Err(error) => {
            warn!(target: LIFECYCLE_TARGET, pid, %error, "SIGTERM failed");
            false
        }
    }
}

#[cfg(not(unix))]
const fn request_exit(_pid: u32) -> bool {
    false
}

/// Polls until the child exits or `grace` elapses; returns whether it exited.
fn wait_for_exit(child: &mut Child, grace: Duration) -> Result<bool, LifecycleError> {
    let pid = child.id();
    let deadline = Instant::now() + grace;
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|source| LifecycleError::Wait { pid, source })?
        {
            debug!(target: LIFECYCLE_TARGET, pid, ?status, "rclone exited");
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}
