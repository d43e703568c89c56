//! Download, verify and install pipeline.
//!
//! [`Provisioner::provision`] runs the whole sequence for one platform and
//! version. The archive never touches the disk before its digest has been
//! matched against the published manifest, and the executable only becomes
//! visible at its final path through an atomic rename of a fully written,
//! already executable temporary file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::archive::extract_binary;
use crate::error::ProvisionError;
use crate::fetch::ReleaseFetcher;
use crate::manifest::{ChecksumManifest, Verification, verify_sha256};
use crate::platform::PlatformKey;
use crate::release::{ReleaseArtifact, ReleaseSource, ReleaseVersion};

const INSTALL_TARGET: &str = "rclone_provision::install";

#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Installs verified rclone executables.
#[derive(Debug)]
pub struct Provisioner<F> {
    fetcher: F,
    source: ReleaseSource,
}

impl<F: ReleaseFetcher> Provisioner<F> {
    /// Builds a provisioner that downloads from `source` through `fetcher`.
    #[must_use]
    pub const fn new(fetcher: F, source: ReleaseSource) -> Self {
        Self { fetcher, source }
    }

    /// Release location in use.
    #[must_use]
    pub const fn source(&self) -> &ReleaseSource {
        &self.source
    }

    /// Installs rclone `version` for `platform` into `destination`.
    ///
    /// The destination directory is emptied first. On success it contains
    /// exactly the executable, whose path is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] when a download fails, the manifest does not
    /// vouch for the archive, the archive lacks the executable, or the
    /// filesystem rejects any step. Integrity failures abort before anything
    /// is extracted.
    pub fn provision(
        &self,
        platform: PlatformKey,
        version: &ReleaseVersion,
        destination: &Path,
    ) -> Result<PathBuf, ProvisionError> {
        let artifact = ReleaseArtifact::new(version.clone(), platform);
        info!(
            target: INSTALL_TARGET,
            version = %version,
            platform = %platform,
            destination = %destination.display(),
            "provisioning rclone"
        );

        reset_directory(destination)?;

        let archive_url = artifact.url(&self.source)?;
        let archive = self
            .fetcher
            .fetch(&archive_url)
            .map_err(|source| ProvisionError::Fetch {
                url: archive_url.clone(),
                source,
            })?;

        let manifest_url = self.source.manifest_url(version)?;
        let manifest_bytes =
            self.fetcher
                .fetch(&manifest_url)
                .map_err(|source| ProvisionError::Fetch {
                    url: manifest_url.clone(),
                    source,
                })?;
        let manifest_text =
            String::from_utf8(manifest_bytes).map_err(|source| ProvisionError::ManifestEncoding {
                url: manifest_url.clone(),
                source,
            })?;
        let manifest = ChecksumManifest::parse(&manifest_text);
        debug!(target: INSTALL_TARGET, entries = manifest.len(), "parsed checksum manifest");

        let Some(published) = manifest.digest_for(artifact.filename()) else {
            warn!(
                target: INSTALL_TARGET,
                filename = artifact.filename(),
                "archive missing from checksum manifest"
            );
            return Err(ProvisionError::ManifestIncomplete {
                filename: artifact.filename().to_owned(),
                url: manifest_url,
            });
        };

        if let Verification::Mismatch { expected, actual } = verify_sha256(&archive, published) {
            warn!(
                target: INSTALL_TARGET,
                filename = artifact.filename(),
                %expected,
                %actual,
                "archive checksum mismatch"
            );
            return Err(ProvisionError::ChecksumMismatch {
                filename: artifact.filename().to_owned(),
                expected,
                actual,
            });
        }
        debug!(target: INSTALL_TARGET, filename = artifact.filename(), "archive verified");

        let binary_path = destination.join(platform.binary_name());
        install_from_archive(&artifact, &archive, &binary_path)?;

        if !binary_path.is_file() {
            return Err(ProvisionError::InstallIncomplete { path: binary_path });
        }
        info!(
            target: INSTALL_TARGET,
            path = %binary_path.display(),
            "rclone installed"
        );
        Ok(binary_path)
    }
}

fn install_from_archive(
    artifact: &ReleaseArtifact,
    archive: &[u8],
    binary_path: &Path,
) -> Result<(), ProvisionError> {
    let directory = binary_path.parent().unwrap_or_else(|| Path::new("."));
    let platform = artifact.platform();
    let binary = platform.binary_name();

    let mut staged = tempfile::Builder::new()
        .prefix(".rclone-")
        .tempfile_in(directory)
        .map_err(|source| ProvisionError::io("create temporary file in", directory, source))?;
    let written = extract_binary(archive, binary, staged.as_file_mut()).map_err(|source| {
        ProvisionError::Extraction {
            filename: artifact.filename().to_owned(),
            binary: binary.to_owned(),
            source,
        }
    })?;
    staged
        .as_file_mut()
        .flush()
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|source| ProvisionError::io("flush", staged.path(), source))?;
    debug!(target: INSTALL_TARGET, bytes = written, "executable extracted");

    if platform.os().is_posix() {
        mark_executable(&staged)?;
    }

    staged
        .persist(binary_path)
        .map_err(|error| ProvisionError::io("rename into", binary_path, error.error))?;
    Ok(())
}

fn reset_directory(destination: &Path) -> Result<(), ProvisionError> {
    if destination.exists() {
        debug!(
            target: INSTALL_TARGET,
            path = %destination.display(),
            "removing previous install"
        );
        fs::remove_dir_all(destination)
            .map_err(|source| ProvisionError::io("remove", destination, source))?;
    }
    fs::create_dir_all(destination)
        .map_err(|source| ProvisionError::io("create", destination, source))
}

#[cfg(unix)]
fn mark_executable(staged: &NamedTempFile) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(staged.path(), fs::Permissions::from_mode(EXECUTABLE_MODE))
        .map_err(|source| ProvisionError::io("set permissions on", staged.path(), source))
}

#[cfg(not(unix))]
fn mark_executable(staged: &NamedTempFile) -> Result<(), ProvisionError> {
    debug!(
        target: INSTALL_TARGET,
        path = %staged.path().display(),
        "host cannot express POSIX modes; leaving permissions unchanged"
    );
    Ok(())
}
