//! Owner of the spawned `rclone rcd` process.

use std::mem;
use std::process::ExitStatus;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;
use super::probe::ensure_endpoint_available;
use super::shutdown::terminate;
use super::spawning::spawn_rcd;
use super::state::{PhaseCell, ProcessState, ServicePhase, ServiceProcess};
use crate::options::ClientOptions;

/// Liveness of the supervised process as seen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// A process is held and has not exited.
    Alive {
        /// Process id.
        pid: u32,
    },
    /// The held process exited on its own.
    Exited {
        /// Exit status reported by the OS.
        status: ExitStatus,
    },
    /// Nothing was started, or it was stopped on request.
    Idle,
}

/// Starts, observes and stops one `rclone rcd` process.
///
/// Lifecycle calls are serialised through a single mutex, so `start` and
/// `stop` may be invoked from several threads. A process that dies on its own
/// is noticed the next time the supervisor looks at it and is never restarted
/// automatically.
#[derive(Debug)]
pub struct Supervisor {
    options: ClientOptions,
    state: Mutex<ProcessState>,
    phase: PhaseCell,
}

impl Supervisor {
    /// Creates a supervisor that has not started anything.
    #[must_use]
    pub const fn new(options: ClientOptions) -> Self {
        Self {
            options,
            state: Mutex::new(ProcessState::NotStarted),
            phase: PhaseCell::new(),
        }
    }

    /// Options the supervisor was built with.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Spawns the server unless one is already running.
    ///
    /// Returns as soon as the process exists; it is not yet ready to answer
    /// control calls.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the binary is missing, the endpoint is
    /// already in use, or the process cannot be spawned. The supervisor stays
    /// stopped in each case.
    pub fn start(&self) -> Result<(), LifecycleError> {
        let mut state = self.lock_state();
        self.reconcile(&mut state);
        if let ProcessState::Running(process) = &*state {
            debug!(target: LIFECYCLE_TARGET, pid = process.pid, "rclone already running");
            return Ok(());
        }

        self.phase.set(ServicePhase::Starting);
        match self.launch() {
            Ok(process) => {
                info!(
                    target: LIFECYCLE_TARGET,
                    pid = process.pid,
                    endpoint = %self.options.endpoint(),
                    "rclone started"
                );
                *state = ProcessState::Running(process);
                self.phase.set(ServicePhase::Running);
                Ok(())
            }
            Err(error) => {
                self.phase.set(ServicePhase::Stopped);
                Err(error)
            }
        }
    }

    fn launch(&self) -> Result<ServiceProcess, LifecycleError> {
        let binary = self.options.binary();
        if !binary.is_installed() {
            return Err(LifecycleError::BinaryMissing {
                path: binary.path().to_path_buf(),
            });
        }
        if self.options.check_endpoint() {
            ensure_endpoint_available(self.options.endpoint())?;
        }
        spawn_rcd(&self.options).map(ServiceProcess::new)
    }

    /// Terminates the server if one is held.
    ///
    /// The handle is released even when termination reports an error.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Wait`] if the process could not be reaped.
    pub fn stop(&self) -> Result<(), LifecycleError> {
        let mut state = self.lock_state();
        self.reconcile(&mut state);
        match mem::replace(&mut *state, ProcessState::Stopped) {
            ProcessState::Running(mut process) => {
                self.phase.set(ServicePhase::Stopping);
                let outcome = terminate(&mut process.child, self.options.shutdown_grace());
                self.phase.set(ServicePhase::Stopped);
                info!(
                    target: LIFECYCLE_TARGET,
                    pid = process.pid,
                    uptime = ?process.uptime(),
                    "rclone stopped"
                );
                outcome
            }
            ProcessState::NotStarted | ProcessState::Exited { .. } | ProcessState::Stopped => {
                debug!(target: LIFECYCLE_TARGET, "rclone not running; nothing to stop");
                Ok(())
            }
        }
    }

    /// Current phase.
    ///
    /// While another thread is starting or stopping the server this returns
    /// the transitional phase instead of waiting for the lock.
    #[must_use]
    pub fn phase(&self) -> ServicePhase {
        match self.state.try_lock() {
            Ok(mut state) => self.reconcile(&mut state),
            Err(TryLockError::Poisoned(poison)) => self.reconcile(&mut poison.into_inner()),
            Err(TryLockError::WouldBlock) => {}
        }
        self.phase.get()
    }

    /// Liveness after reconciling with the OS.
    #[must_use]
    pub fn liveness(&self) -> Liveness {
        let mut state = self.lock_state();
        self.reconcile(&mut state);
        match &*state {
            ProcessState::Running(process) => Liveness::Alive { pid: process.pid },
            ProcessState::Exited { status, .. } => Liveness::Exited { status: *status },
            ProcessState::NotStarted | ProcessState::Stopped => Liveness::Idle,
        }
    }

    /// Whether a live process is held.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.liveness(), Liveness::Alive { .. })
    }

    /// Process id of the running server.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        match self.liveness() {
            Liveness::Alive { pid } => Some(pid),
            Liveness::Exited { .. } | Liveness::Idle => None,
        }
    }

    /// Time since the running server was spawned.
    #[must_use]
    pub fn uptime(&self) -> Option<Duration> {
        let mut state = self.lock_state();
        self.reconcile(&mut state);
        match &*state {
            ProcessState::Running(process) => Some(process.uptime()),
            ProcessState::NotStarted | ProcessState::Exited { .. } | ProcessState::Stopped => None,
        }
    }

    /// Moves a `Running` state whose child has exited to `Exited`.
    fn reconcile(&self, state: &mut ProcessState) {
        let ProcessState::Running(process) = state else {
            self.phase.set(state.phase());
            return;
        };
        let pid = process.pid;
        match process.child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                warn!(target: LIFECYCLE_TARGET, pid, ?status, "rclone exited unexpectedly");
                *state = ProcessState::Exited { pid, status };
            }
            Err(error) => {
                warn!(target: LIFECYCLE_TARGET, pid, %error, "failed to poll rclone status");
            }
        }
        self.phase.set(state.phase());
    }

    fn lock_state(&self) -> MutexGuard<'_, ProcessState> {
        // Recover from poisoning so the child can still be stopped after a panic.
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poison) => poison.into_inner(),
        };
        if let ProcessState::Running(process) = state {
            debug!(
                target: LIFECYCLE_TARGET,
                pid = process.pid,
                "killing rclone on supervisor drop"
            );
            let _ = process.child.kill();
            let _ = process.child.wait();
        }
    }
}
