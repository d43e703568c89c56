//! Error surface of the provisioning pipeline.
//!
//! Every failure carries a [`ProvisionErrorKind`] so callers can branch on the
//! category (network, integrity, extraction, ...) without matching on
//! messages. Underlying causes stay attached through `#[source]`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::archive::ExtractionError;
use crate::fetch::FetchError;
use crate::platform::PlatformError;
use crate::release::VersionError;

/// Category of a provisioning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionErrorKind {
    /// Host or override platform is outside the compatibility matrix.
    UnsupportedPlatform,
    /// The version, release URL or install target is not usable.
    InvalidRequest,
    /// A download failed or returned a non-success status.
    Fetch,
    /// The manifest has no entry for the archive.
    ManifestIncomplete,
    /// The archive digest differs from the manifest.
    ChecksumMismatch,
    /// The archive could not be unpacked.
    Extraction,
    /// Filesystem work around the install failed.
    Install,
}

/// Errors raised while provisioning the rclone binary.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Platform resolution failed.
    #[error(transparent)]
    UnsupportedPlatform(#[from] PlatformError),

    /// The version string was rejected.
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    /// The base URL or a derived URL is malformed.
    #[error("invalid release URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Downloading a release file failed.
    #[error("failed to download {url}: {source}")]
    Fetch {
        /// URL that was requested.
        url: Url,
        /// Underlying transport or status error.
        #[source]
        source: FetchError,
    },

    /// The manifest is not valid text.
    #[error("checksum manifest at {url} is not valid UTF-8")]
    ManifestEncoding {
        /// Manifest URL.
        url: Url,
        /// Decoding error.
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The manifest does not list the archive.
    #[error("{filename} not found in checksum manifest {url}")]
    ManifestIncomplete {
        /// Archive name that was looked up.
        filename: String,
        /// Manifest URL.
        url: Url,
    },

    /// The downloaded archive failed verification.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Archive name.
        filename: String,
        /// Digest published in the manifest.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// Unpacking the verified archive failed.
    #[error("failed to extract {binary} from {filename}: {source}")]
    Extraction {
        /// Archive name.
        filename: String,
        /// Executable that was searched for.
        binary: String,
        /// Underlying extraction error.
        #[source]
        source: ExtractionError,
    },

    /// A filesystem operation during install failed.
    #[error("failed to {action} {path:?}: {source}")]
    Io {
        /// Short description of the attempted operation.
        action: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The requested executable path is not one the installer produces.
    ///
    /// Raised before the destination directory is touched.
    #[error("refusing to install into {path:?}: the executable must be named {expected}")]
    UnmanagedDestination {
        /// Path the caller expects the executable at.
        path: PathBuf,
        /// File name the installer writes for the platform.
        expected: &'static str,
    },

    /// The installed path is not a regular file after installation.
    #[error("installation finished but {path:?} is not a regular file")]
    InstallIncomplete {
        /// Expected binary path.
        path: PathBuf,
    },
}

impl ProvisionError {
    /// Category of this failure.
    #[must_use]
    pub const fn kind(&self) -> ProvisionErrorKind {
        match self {
            Self::UnsupportedPlatform(_) => ProvisionErrorKind::UnsupportedPlatform,
            Self::InvalidVersion(_) | Self::InvalidUrl(_) | Self::UnmanagedDestination { .. } => {
                ProvisionErrorKind::InvalidRequest
            }
            Self::Fetch { .. } => ProvisionErrorKind::Fetch,
            Self::ManifestEncoding { .. } | Self::ManifestIncomplete { .. } => {
                ProvisionErrorKind::ManifestIncomplete
            }
            Self::ChecksumMismatch { .. } => ProvisionErrorKind::ChecksumMismatch,
            Self::Extraction { .. } => ProvisionErrorKind::Extraction,
            Self::Io { .. } | Self::InstallIncomplete { .. } => ProvisionErrorKind::Install,
        }
    }

    /// Whether the archive could not be trusted.
    ///
    /// A manifest without an entry for the archive is treated exactly like a
    /// digest mismatch.
    #[must_use]
    pub const fn is_integrity_failure(&self) -> bool {
        matches!(
            self.kind(),
            ProvisionErrorKind::ManifestIncomplete | ProvisionErrorKind::ChecksumMismatch
        )
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
