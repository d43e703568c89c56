//! Facade combining the supervisor with the control client.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use rclone_config::ServiceEndpoint;
use rclone_provision::{PlatformKey, ProvisionError, Provisioner, ReleaseFetcher, ReleaseVersion};

use crate::binary::InstalledBinary;
use crate::control::{BackendConfig, ControlClient, ControlError, VersionInfo};
use crate::lifecycle::{LifecycleError, Liveness, ServicePhase, Supervisor};
use crate::options::ClientOptions;
use crate::readiness::{
    CancelToken, ReadinessCheck, ReadinessError, ReadinessPolicy, wait_for_ready,
};

const CLIENT_TARGET: &str = "rclone_client::client";

/// Sole owner and control-plane client of one `rclone rcd` process.
///
/// Lifecycle calls go through the [`Supervisor`]; everything else is a single
/// remote-control round trip, except backend create and delete which check
/// `config/listremotes` first. One client per endpoint: two clients configured
/// with the same endpoint would race on `start()`.
#[derive(Debug)]
pub struct RcloneClient {
    supervisor: Supervisor,
    control: ControlClient,
}

impl RcloneClient {
    /// Builds a client from `options`. Nothing is started.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] when the HTTP client cannot be set up for the
    /// endpoint.
    pub fn new(options: ClientOptions) -> Result<Self, ControlError> {
        let control = ControlClient::new(options.endpoint(), options.request_timeout())?;
        Ok(Self {
            supervisor: Supervisor::new(options),
            control,
        })
    }

    /// Client for the executable installed below `package_root`.
    ///
    /// # Errors
    ///
    /// See [`RcloneClient::new`].
    pub fn for_package(endpoint: ServiceEndpoint, package_root: &Path) -> Result<Self, ControlError> {
        Self::new(ClientOptions::new(
            endpoint,
            InstalledBinary::in_package(package_root),
        ))
    }

    /// Options the client was built with.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        self.supervisor.options()
    }

    /// Remote-control endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &ServiceEndpoint {
        self.supervisor.options().endpoint()
    }

    /// Spawns the server unless it is already running.
    ///
    /// Readiness is not awaited; see [`RcloneClient::wait_until_operational`].
    ///
    /// # Errors
    ///
    /// See [`Supervisor::start`].
    pub fn start(&self) -> Result<(), LifecycleError> {
        self.supervisor.start()
    }

    /// Terminates the server if it is running.
    ///
    /// # Errors
    ///
    /// See [`Supervisor::stop`].
    pub fn stop(&self) -> Result<(), LifecycleError> {
        self.supervisor.stop()
    }

    /// Whether a live server answers `rc/noop` within the probe timeout.
    ///
    /// Never fails: a missing process, a refused connection, a timeout or a
    /// rejected call all read as `false`.
    #[must_use]
    pub fn operational(&self) -> bool {
        if !self.supervisor.is_running() {
            return false;
        }
        match self.control.noop(self.options().probe_timeout()) {
            Ok(()) => true,
            Err(error) => {
                debug!(target: CLIENT_TARGET, %error, "liveness probe failed");
                false
            }
        }
    }

    /// Polls [`RcloneClient::operational`] until it holds or `policy` runs out.
    ///
    /// Returns the number of probes issued.
    ///
    /// # Errors
    ///
    /// Returns [`ReadinessError::StartupTimeout`] when the bound is exhausted,
    /// [`ReadinessError::StartupFailed`] when the process exits while waiting,
    /// [`ReadinessError::NotStarted`] when nothing was started, and
    /// [`ReadinessError::Cancelled`] when `cancel` fires.
    pub fn wait_until_operational(
        &self,
        policy: &ReadinessPolicy,
        cancel: Option<&CancelToken>,
    ) -> Result<u32, ReadinessError> {
        wait_for_ready(policy, cancel, || match self.supervisor.liveness() {
            Liveness::Idle => ReadinessCheck::Idle,
            Liveness::Exited { status } => ReadinessCheck::Exited {
                exit_code: status.code(),
            },
            Liveness::Alive { .. } if self.operational() => ReadinessCheck::Ready,
            Liveness::Alive { .. } => ReadinessCheck::Pending,
        })
    }

    /// Version report of the running server.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Communication`] when the server is not
    /// reachable.
    pub fn version(&self) -> Result<VersionInfo, ControlError> {
        self.control.version()
    }

    /// Names of the configured backends.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::list_remotes`].
    pub fn list_remotes(&self) -> Result<BTreeSet<String>, ControlError> {
        self.control.list_remotes()
    }

    /// Registers backend `name` of type `backend_type` with `options`.
    ///
    /// Takes two round trips: an existence check, then the create.
    ///
    /// # Errors
    ///
    /// See [`ControlClient::config_create`].
    pub fn config_create(
        &self,
        name: &str,
        backend_type: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<(), ControlError> {
        self.control
            .config_create(&BackendConfig::new(name, backend_type, options.clone()))
    }

    /// Removes backend `name`.
    ///
    /// Takes two round trips: an existence check, then the delete.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NotFound`] when no such backend exists; see
    /// [`ControlClient::config_delete`].
    pub fn config_delete(&self, name: &str) -> Result<(), ControlError> {
        self.control.config_delete(name)
    }

    /// Whether the executable exists at its expected path.
    ///
    /// Only inspects the filesystem. Installation is the separate, explicit
    /// [`RcloneClient::ensure_installed`].
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.options().binary().is_installed()
    }

    /// Provisions the executable into its expected directory unless present.
    ///
    /// The directory holding the executable is emptied and recreated, so it
    /// must be dedicated to it, as the `bin/` of [`InstalledBinary::in_package`]
    /// is. The executable's file name must be the one `platform` ships;
    /// anything else is refused before the directory is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnmanagedDestination`] when the file name
    /// does not match `platform`, [`ProvisionError`] when provisioning fails,
    /// or [`ProvisionError::InstallIncomplete`] when the installed file does
    /// not land at the path this client launches.
    pub fn ensure_installed<F: ReleaseFetcher>(
        &self,
        provisioner: &Provisioner<F>,
        platform: PlatformKey,
        version: &ReleaseVersion,
    ) -> Result<PathBuf, ProvisionError> {
        let binary = self.options().binary();
        if binary.is_installed() {
            debug!(
                target: CLIENT_TARGET,
                path = %binary.path().display(),
                "rclone already installed"
            );
            return Ok(binary.path().to_path_buf());
        }
        let expected = platform.binary_name();
        if binary.path().file_name() != Some(OsStr::new(expected)) {
            return Err(ProvisionError::UnmanagedDestination {
                path: binary.path().to_path_buf(),
                expected,
            });
        }
        let installed = provisioner.provision(platform, version, binary.directory())?;
        if installed != binary.path() {
            return Err(ProvisionError::InstallIncomplete {
                path: binary.path().to_path_buf(),
            });
        }
        info!(target: CLIENT_TARGET, path = %installed.display(), "rclone installed");
        Ok(installed)
    }

    /// Current state-machine phase.
    #[must_use]
    pub fn phase(&self) -> ServicePhase {
        self.supervisor.phase()
    }

    /// Liveness of the supervised process.
    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.supervisor.liveness()
    }

    /// Process id of the running server.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }
}
