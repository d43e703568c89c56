//! Readiness polling after a fire-and-forget start.
//!
//! `start()` returns once the process exists. Callers observe readiness by
//! polling `operational()` at a fixed interval with a bounded number of
//! attempts; [`ReadinessPolicy`] captures both numbers and
//! [`CancelToken`] lets another thread abandon the wait early.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

const READINESS_TARGET: &str = "rclone_client::readiness";

/// Default delay between readiness probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Default number of readiness probes before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

/// Interval and attempt bound for readiness polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl ReadinessPolicy {
    /// Polls every `interval`, at most `max_attempts` times.
    ///
    /// A bound of zero is raised to one so the server is probed at least once.
    #[must_use]
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// Delay between probes.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Maximum number of probes.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on time spent sleeping between probes.
    #[must_use]
    pub const fn total_budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_ATTEMPTS)
    }
}

/// Shared flag that aborts a readiness wait.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reasons a readiness wait ends without the server becoming operational.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadinessError {
    /// The attempt bound was exhausted.
    #[error("rclone did not become operational after {attempts} probes ({waited:?})")]
    StartupTimeout {
        /// Probes issued.
        attempts: u32,
        /// Time spent sleeping between probes.
        waited: Duration,
    },
    /// The process exited while the wait was in progress.
    #[error("rclone exited during startup (exit code {exit_code:?})")]
    StartupFailed {
        /// Exit code, if the process was not killed by a signal.
        exit_code: Option<i32>,
    },
    /// No process is held, so nothing can become ready.
    #[error("rclone has not been started")]
    NotStarted,
    /// The cancel token fired.
    #[error("readiness wait was cancelled")]
    Cancelled,
}

/// Outcome of one readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadinessCheck {
    /// The server answered the control protocol.
    Ready,
    /// The process is alive but not answering yet.
    Pending,
    /// The process exited.
    Exited {
        /// Exit code, if any.
        exit_code: Option<i32>,
    },
    /// No process is held.
    Idle,
}

/// Runs `check` until it reports ready or a terminal condition occurs.
///
/// Returns the number of probes issued on success.
pub(crate) fn wait_for_ready<F>(
    policy: &ReadinessPolicy,
    cancel: Option<&CancelToken>,
    mut check: F,
) -> Result<u32, ReadinessError>
where
    F: FnMut() -> ReadinessCheck,
{
    let mut waited = Duration::ZERO;
    for attempt in 1..=policy.max_attempts() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(ReadinessError::Cancelled);
        }
        match check() {
            ReadinessCheck::Ready => {
                debug!(target: READINESS_TARGET, attempt, "rclone operational");
                return Ok(attempt);
            }
            ReadinessCheck::Exited { exit_code } => {
                return Err(ReadinessError::StartupFailed { exit_code });
            }
            ReadinessCheck::Idle => return Err(ReadinessError::NotStarted),
            ReadinessCheck::Pending => {}
        }
        if attempt < policy.max_attempts() {
            thread::sleep(policy.interval());
            waited = waited.saturating_add(policy.interval());
        }
    }
    Err(ReadinessError::StartupTimeout {
        attempts: policy.max_attempts(),
        waited,
    })
}
