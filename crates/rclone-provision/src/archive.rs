//! Extraction of the rclone executable from a verified release archive.

use std::io::{self, Cursor, Write};

use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

/// Errors raised while unpacking the archive.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The bytes are not a readable zip archive.
    #[error("archive is not a valid zip file: {0}")]
    Archive(#[from] ZipError),
    /// No entry carries the expected executable name.
    #[error("archive contains no entry named '{binary}'")]
    MissingEntry {
        /// Executable name that was searched for.
        binary: String,
    },
    /// Writing the extracted entry failed.
    #[error("failed to write extracted entry: {0}")]
    Write(#[source] io::Error),
}

/// Copies the entry whose base name is `binary_name` into `output`.
///
/// Release archives nest the executable in a versioned directory, so only the
/// final path component of each entry is compared. Directories are skipped.
/// The first matching entry is extracted; nothing else is written.
///
/// # Errors
///
/// Returns [`ExtractionError`] for malformed archives, archives without a
/// matching entry, and write failures.
pub fn extract_binary<W: Write>(
    archive_bytes: &[u8],
    binary_name: &str,
    output: &mut W,
) -> Result<u64, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || !base_name_matches(entry.name(), binary_name) {
            continue;
        }
        let written = io::copy(&mut entry, output).map_err(ExtractionError::Write)?;
        output.flush().map_err(ExtractionError::Write)?;
        return Ok(written);
    }
    Err(ExtractionError::MissingEntry {
        binary: binary_name.to_owned(),
    })
}

fn base_name_matches(entry_name: &str, binary_name: &str) -> bool {
    entry_name
        .rsplit(['/', '\\'])
        .next()
        .is_some_and(|base| base == binary_name)
}
