//! Wiring between configuration, telemetry and the installer.

use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ortho_config::OrthoConfig;

use rclone_config::ProvisionConfig;

use crate::error::ProvisionError;
use crate::fetch::{HttpFetcher, ReleaseFetcher};
use crate::install::Provisioner;
use crate::platform::PlatformKey;
use crate::release::{ReleaseSource, ReleaseVersion};
use crate::telemetry;

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    path: PathBuf,
    platform: PlatformKey,
    version: ReleaseVersion,
}

impl InstallReport {
    /// Location of the installed executable.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Platform the executable was installed for.
    #[must_use]
    pub const fn platform(&self) -> PlatformKey {
        self.platform
    }

    /// Installed release.
    #[must_use]
    pub const fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Platform tag for labelling the package, e.g. `linux_amd64`.
    #[must_use]
    pub fn platform_tag(&self) -> String {
        self.platform.artifact_tag()
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "path={}", self.path.display())?;
        write!(formatter, "platform_tag={}", self.platform_tag())
    }
}

/// Installs rclone as described by `config` using `fetcher`.
///
/// Platform and version are validated before the fetcher is used, so an
/// unsupported override fails without network activity.
///
/// # Errors
///
/// Returns [`ProvisionError`] for invalid overrides and any failure of
/// [`Provisioner::provision`].
pub fn provision_with_config<F: ReleaseFetcher>(
    config: &ProvisionConfig,
    fetcher: F,
) -> Result<InstallReport, ProvisionError> {
    let platform = PlatformKey::resolve(config.system(), config.arch())?;
    let version = ReleaseVersion::parse(config.rclone_version())?;
    let source = ReleaseSource::new(config.base_url())?;
    let destination = config.bin_dir();

    let provisioner = Provisioner::new(fetcher, source);
    let path = provisioner.provision(platform, &version, destination.as_std_path())?;
    Ok(InstallReport {
        path,
        platform,
        version,
    })
}

/// Runs the provisioning entry point.
///
/// Configuration is read from `args`, `BUILD_*` environment variables and
/// configuration files. The install report goes to `stdout`; failures are
/// written to `stderr` only.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let config = match ProvisionConfig::load_from_iter(args) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(stderr, "rclone-provision: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = telemetry::initialise(&config) {
        let _ = writeln!(stderr, "rclone-provision: {error}");
        return ExitCode::FAILURE;
    }

    let fetcher = match HttpFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(error) => {
            let _ = writeln!(stderr, "rclone-provision: {error}");
            return ExitCode::FAILURE;
        }
    };

    match provision_with_config(&config, fetcher) {
        Ok(report) => {
            if writeln!(stdout, "{report}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "rclone-provision: {error}");
            ExitCode::FAILURE
        }
    }
}
