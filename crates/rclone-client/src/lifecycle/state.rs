//! Supervisor state machine.

use std::fmt;
use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Externally visible phase of the supervised process.
///
/// Transitions follow `Stopped → Starting → Running → Stopping → Stopped`.
/// A process that dies on its own is reported as `Stopped` once observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServicePhase {
    /// No process is held.
    Stopped,
    /// A process is being spawned.
    Starting,
    /// A live process is held.
    Running,
    /// The held process is being terminated.
    Stopping,
}

impl ServicePhase {
    const fn to_raw(self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Starting => 1,
            Self::Running => 2,
            Self::Stopping => 3,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ServicePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(label)
    }
}

/// Phase readable without taking the process lock.
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(ServicePhase::Stopped.to_raw()))
    }

    pub(crate) fn get(&self) -> ServicePhase {
        ServicePhase::from_raw(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, phase: ServicePhase) {
        self.0.store(phase.to_raw(), Ordering::Release);
    }
}

/// A spawned `rclone rcd` process.
#[derive(Debug)]
pub(crate) struct ServiceProcess {
    pub(crate) child: Child,
    pub(crate) pid: u32,
    pub(crate) started_at: Instant,
}

impl ServiceProcess {
    pub(crate) fn new(child: Child) -> Self {
        let pid = child.id();
        Self {
            child,
            pid,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// What the supervisor currently holds.
#[derive(Debug)]
pub(crate) enum ProcessState {
    /// Nothing has been started yet.
    NotStarted,
    /// A process is held and was alive when last checked.
    Running(ServiceProcess),
    /// The held process exited without being asked to.
    Exited {
        /// Process that exited.
        pid: u32,
        /// Exit status collected during reconciliation.
        status: ExitStatus,
    },
    /// The process was stopped on request.
    Stopped,
}

impl ProcessState {
    pub(crate) const fn phase(&self) -> ServicePhase {
        match self {
            Self::Running(_) => ServicePhase::Running,
            Self::NotStarted | Self::Exited { .. } | Self::Stopped => ServicePhase::Stopped,
        }
    }
}
