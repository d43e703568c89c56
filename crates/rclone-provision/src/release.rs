//! Release naming and download locations.

use std::fmt;

use thiserror::Error;
use url::Url;

use rclone_config::DEFAULT_RELEASE_BASE_URL;

use crate::platform::PlatformKey;

/// Name of the checksum manifest published next to each release.
pub const MANIFEST_NAME: &str = "SHA256SUMS";

const PROJECT: &str = "rclone";

/// Validated rclone release version, stored without the leading `v`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Parses `1.72.1` or `v1.72.1`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] for empty input or characters that cannot
    /// appear in a release directory name.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if bare.is_empty() {
            return Err(VersionError::Empty);
        }
        if let Some(invalid) = bare
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
        {
            return Err(VersionError::InvalidCharacter {
                version: raw.to_owned(),
                character: invalid,
            });
        }
        Ok(Self(bare.to_owned()))
    }

    /// Version without the leading `v`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Release tag, `v<version>`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Raised when a version string cannot name a release.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// No version was given.
    #[error("release version must not be empty")]
    Empty,
    /// The version contains a character outside `[A-Za-z0-9.-]`.
    #[error("release version '{version}' contains invalid character '{character}'")]
    InvalidCharacter {
        /// Raw version string.
        version: String,
        /// First offending character.
        character: char,
    },
}

/// Download server publishing `v<version>/` release directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    base: Url,
}

impl ReleaseSource {
    /// Uses the given base URL; a trailing slash is optional.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when the base is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let normalised = format!("{}/", base.trim_end_matches('/'));
        Ok(Self {
            base: Url::parse(&normalised)?,
        })
    }

    /// The official rclone download server.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] only if the built-in base URL is invalid.
    pub fn official() -> Result<Self, url::ParseError> {
        Self::new(DEFAULT_RELEASE_BASE_URL)
    }

    /// Base URL, always ending in `/`.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// URL of a file inside a version directory.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the joined URL is invalid.
    pub fn file_url(&self, version: &ReleaseVersion, file: &str) -> Result<Url, url::ParseError> {
        self.base.join(&format!("{}/{file}", version.tag()))
    }

    /// URL of the checksum manifest for a version.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the joined URL is invalid.
    pub fn manifest_url(&self, version: &ReleaseVersion) -> Result<Url, url::ParseError> {
        self.file_url(version, MANIFEST_NAME)
    }
}

/// Identity of the archive to download for one version and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    version: ReleaseVersion,
    platform: PlatformKey,
    filename: String,
}

impl ReleaseArtifact {
    /// Derives the archive name, `rclone-v<version>-<os>-<arch>.zip`.
    #[must_use]
    pub fn new(version: ReleaseVersion, platform: PlatformKey) -> Self {
        let filename = format!(
            "{PROJECT}-{}-{}-{}.zip",
            version.tag(),
            platform.os().release_id(),
            platform.arch().as_str()
        );
        Self {
            version,
            platform,
            filename,
        }
    }

    /// Release version.
    #[must_use]
    pub const fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Target platform.
    #[must_use]
    pub const fn platform(&self) -> PlatformKey {
        self.platform
    }

    /// Archive file name as listed in the manifest.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Download URL of the archive.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if the joined URL is invalid.
    pub fn url(&self, source: &ReleaseSource) -> Result<Url, url::ParseError> {
        source.file_url(&self.version, &self.filename)
    }
}
