//! Host platform normalisation.
//!
//! Raw operating system and architecture names (as reported by the host or
//! supplied through `BUILD_SYSTEM`/`BUILD_ARCH`) are mapped through closed
//! lookup tables onto the vocabulary used by rclone release artefacts.
//! Anything outside the tables is rejected; there is no best-effort guess.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Raw operating system names and the [`Os`] they resolve to.
const OS_TABLE: &[(&str, Os)] = &[
    ("windows", Os::Windows),
    ("linux", Os::Linux),
    ("darwin", Os::MacOs),
    ("macos", Os::MacOs),
    ("osx", Os::MacOs),
];

/// Raw architecture names and the [`Arch`] they resolve to.
const ARCH_TABLE: &[(&str, Arch)] = &[
    ("x86_64", Arch::Amd64),
    ("amd64", Arch::Amd64),
    ("aarch64", Arch::Arm64),
    ("arm64", Arch::Arm64),
];

/// Supported operating systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Microsoft Windows.
    Windows,
    /// Linux.
    Linux,
    /// Apple macOS.
    MacOs,
}

impl Os {
    /// Every supported operating system.
    pub const ALL: [Self; 3] = [Self::Windows, Self::Linux, Self::MacOs];

    /// Canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
        }
    }

    /// Identifier used in release file names.
    #[must_use]
    pub const fn release_id(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "osx",
        }
    }

    /// Whether POSIX execute bits are meaningful on this system.
    #[must_use]
    pub const fn is_posix(self) -> bool {
        !matches!(self, Self::Windows)
    }

    /// File name of the rclone executable on this system.
    #[must_use]
    pub const fn binary_name(self) -> &'static str {
        match self {
            Self::Windows => "rclone.exe",
            Self::Linux | Self::MacOs => "rclone",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = PlatformError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        lookup(OS_TABLE, raw).ok_or_else(|| PlatformError::UnsupportedOs {
            value: raw.to_owned(),
        })
    }
}

/// Supported CPU architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86.
    Amd64,
    /// 64-bit ARM.
    Arm64,
}

impl Arch {
    /// Every supported architecture.
    pub const ALL: [Self; 2] = [Self::Amd64, Self::Arm64];

    /// Canonical identifier, identical to the release file name component.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = PlatformError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        lookup(ARCH_TABLE, raw).ok_or_else(|| PlatformError::UnsupportedArch {
            value: raw.to_owned(),
        })
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], raw: &str) -> Option<T> {
    let key = raw.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

/// Normalised `(Os, Arch)` pair selecting a release artefact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    os: Os,
    arch: Arch,
}

impl PlatformKey {
    /// Builds a key from already-normalised parts.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Resolves raw names through the normalisation tables.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when either name is not in the tables.
    pub fn parse(os: &str, arch: &str) -> Result<Self, PlatformError> {
        Ok(Self::new(os.parse()?, arch.parse()?))
    }

    /// Describes the host this process runs on.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] on hosts outside the compatibility matrix.
    pub fn detect() -> Result<Self, PlatformError> {
        Self::parse(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Uses explicit overrides where given and host detection otherwise.
    ///
    /// Overrides are validated against the same tables as detected values.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] for any value outside the tables.
    pub fn resolve(os: Option<&str>, arch: Option<&str>) -> Result<Self, PlatformError> {
        let os_name = os.unwrap_or(std::env::consts::OS);
        let arch_name = arch.unwrap_or(std::env::consts::ARCH);
        Self::parse(os_name, arch_name)
    }

    /// Operating system component.
    #[must_use]
    pub const fn os(self) -> Os {
        self.os
    }

    /// Architecture component.
    #[must_use]
    pub const fn arch(self) -> Arch {
        self.arch
    }

    /// File name of the rclone executable for this platform.
    #[must_use]
    pub const fn binary_name(self) -> &'static str {
        self.os.binary_name()
    }

    /// Tag distinguishing build artefacts per platform, e.g. `linux_amd64`.
    #[must_use]
    pub fn artifact_tag(self) -> String {
        format!("{}_{}", self.os.release_id(), self.arch.as_str())
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.os, self.arch)
    }
}

/// Raised when a platform name is outside the compatibility matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Operating system is not supported.
    #[error("operating system '{value}' is not supported")]
    UnsupportedOs {
        /// Raw value that failed to resolve.
        value: String,
    },
    /// Architecture is not supported.
    #[error("architecture '{value}' is not supported")]
    UnsupportedArch {
        /// Raw value that failed to resolve.
        value: String,
    },
}
