//! Request and response bodies of the remote-control protocol.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named backend configuration sent to `config/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendConfig {
    name: String,
    #[serde(rename = "type")]
    backend_type: String,
    #[serde(rename = "parameters")]
    options: BTreeMap<String, String>,
    opt: CreateOptions,
}

impl BackendConfig {
    /// Describes backend `name` of type `backend_type` with `options`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        backend_type: impl Into<String>,
        options: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            backend_type: backend_type.into(),
            options,
            opt: CreateOptions::default(),
        }
    }

    /// Backend name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend type, for example `local` or `s3`.
    #[must_use]
    pub fn backend_type(&self) -> &str {
        &self.backend_type
    }

    /// Backend options.
    #[must_use]
    pub const fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOptions {
    non_interactive: bool,
    obscure: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            non_interactive: true,
            obscure: false,
        }
    }
}

/// Body naming a single backend.
#[derive(Debug, Serialize)]
pub(crate) struct NamedBackend<'a> {
    pub(crate) name: &'a str,
}

/// Empty request body.
#[derive(Debug, Serialize)]
pub(crate) struct Empty {}

/// Version report of a running server, from `core/version`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Version string, for example `v1.72.1`.
    pub version: String,
    /// Numeric version components.
    #[serde(default)]
    pub decomposed: Vec<u64>,
    /// Whether the server is a beta build.
    #[serde(default)]
    pub is_beta: bool,
    /// Whether the server was built from a git checkout.
    #[serde(default)]
    pub is_git: bool,
    /// Operating system the server was built for.
    #[serde(default)]
    pub os: String,
    /// Architecture the server was built for.
    #[serde(default)]
    pub arch: String,
    /// Go toolchain version.
    #[serde(default)]
    pub go_version: String,
}

/// Response of `config/listremotes`.
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteList {
    #[serde(default)]
    pub(crate) remotes: Option<Vec<String>>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}
