//! Acquisition of a verified rclone executable for the host platform.
//!
//! The `rclone-provision` crate downloads the official release archive for a
//! platform and version, checks it against the published `SHA256SUMS`
//! manifest, and installs the executable into a package directory. It is the
//! build-time half of the toolkit; `rclone-client` only needs the resulting
//! file.
//!
//! # Pipeline
//!
//! [`Provisioner::provision`] performs, in order: destination cleanup, archive
//! download, manifest download and lookup, SHA-256 verification, extraction
//! into a private temporary file, permission fix-up, and an atomic rename into
//! place. Platform names are normalised by [`PlatformKey`] before any of this
//! starts, so an unsupported host fails without touching the network.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use rclone_provision::{HttpFetcher, PlatformKey, Provisioner, ReleaseSource, ReleaseVersion};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provisioner = Provisioner::new(HttpFetcher::new()?, ReleaseSource::official()?);
//! let path = provisioner.provision(
//!     PlatformKey::detect()?,
//!     &ReleaseVersion::parse("1.72.1")?,
//!     Path::new("package/bin"),
//! )?;
//! println!("installed {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod fetch;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod runner;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::error::{ProvisionError, ProvisionErrorKind};
pub use self::fetch::{FetchError, HttpFetcher, ReleaseFetcher};
pub use self::install::Provisioner;
pub use self::manifest::{ChecksumManifest, Verification, sha256_hex, verify_sha256};
pub use self::platform::{Arch, Os, PlatformError, PlatformKey};
pub use self::release::{MANIFEST_NAME, ReleaseArtifact, ReleaseSource, ReleaseVersion, VersionError};
pub use self::runner::{InstallReport, provision_with_config, run};
