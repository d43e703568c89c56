//! `SHA256SUMS` parsing and digest verification.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

const SHA256_HEX_LEN: usize = 64;

/// Digests published for one release, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    digests: HashMap<String, String>,
}

impl ChecksumManifest {
    /// Parses `<hex-digest>  <filename>` lines.
    ///
    /// Lines that do not consist of exactly a 64-character hex digest and a
    /// file name are skipped, which also drops the armour of clear-signed
    /// manifests. A leading `*` binary-mode marker on the file name is
    /// ignored. The first entry for a file name wins.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut digests = HashMap::new();
        for line in text.lines() {
            let mut parts = line.split_whitespace();
            let (Some(digest), Some(name), None) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            if !is_sha256_hex(digest) {
                continue;
            }
            let filename = name.strip_prefix('*').unwrap_or(name);
            digests
                .entry(filename.to_owned())
                .or_insert_with(|| digest.to_ascii_lowercase());
        }
        Self { digests }
    }

    /// Lower-case hex digest recorded for `filename`.
    #[must_use]
    pub fn digest_for(&self, filename: &str) -> Option<&str> {
        self.digests.get(filename).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Whether the manifest lists no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

fn is_sha256_hex(candidate: &str) -> bool {
    candidate.len() == SHA256_HEX_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Lower-case hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Outcome of comparing downloaded bytes with the published digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Digests agree.
    Match,
    /// Digests differ.
    Mismatch {
        /// Digest from the manifest.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },
}

/// Compares the SHA-256 of `bytes` with `expected`, ignoring hex case.
#[must_use]
pub fn verify_sha256(bytes: &[u8], expected: &str) -> Verification {
    let actual = sha256_hex(bytes);
    if actual.eq_ignore_ascii_case(expected) {
        Verification::Match
    } else {
        Verification::Mismatch {
            expected: expected.to_ascii_lowercase(),
            actual,
        }
    }
}
