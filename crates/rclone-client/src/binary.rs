//! Location of the provisioned rclone executable.

use std::path::{Path, PathBuf};

/// Directory below the package root that holds the executable.
pub const BIN_DIR: &str = "bin";

/// File name of the rclone executable on the host.
#[must_use]
pub const fn binary_name() -> &'static str {
    if cfg!(windows) { "rclone.exe" } else { "rclone" }
}

/// Path of an rclone executable the supervisor launches.
///
/// Construction never touches the filesystem; [`InstalledBinary::is_installed`]
/// is the only check and it has no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    path: PathBuf,
}

impl InstalledBinary {
    /// Uses an explicit executable path.
    ///
    /// [`crate::RcloneClient::ensure_installed`] only provisions into paths
    /// whose file name is the platform's executable name.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Expected install location below a package root, `<root>/bin/rclone`.
    #[must_use]
    pub fn in_package(root: &Path) -> Self {
        Self::at(root.join(BIN_DIR).join(binary_name()))
    }

    /// Executable path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the executable.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Whether a regular file exists at the path.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.path.is_file()
    }
}
