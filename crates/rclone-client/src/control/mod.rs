//! Client for rclone's remote-control HTTP API.
//!
//! Every call is a `POST http://<host>:<port>/<path>` with a JSON object body
//! and performs exactly one round trip bounded by an explicit timeout.
//! Non-success statuses carry `{"error": ..., "status": ...}` bodies and map to
//! [`ControlError::Protocol`]; connection failures and timeouts map to
//! [`ControlError::Communication`].

mod error;
mod models;
mod names;

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use rclone_config::ServiceEndpoint;

pub use self::error::ControlError;
pub use self::models::{BackendConfig, VersionInfo};

use self::models::{Empty, ErrorBody, NamedBackend, RemoteList};
use self::names::validate_backend_name;

const CONTROL_TARGET: &str = "rclone_client::control";

const NOOP_PATH: &str = "rc/noop";
const VERSION_PATH: &str = "core/version";
const CONFIG_CREATE_PATH: &str = "config/create";
const CONFIG_DELETE_PATH: &str = "config/delete";
const LIST_REMOTES_PATH: &str = "config/listremotes";

/// Issues remote-control calls against one endpoint.
#[derive(Debug, Clone)]
pub struct ControlClient {
    http: Client,
    base: Url,
    request_timeout: Duration,
}

impl ControlClient {
    /// Builds a client for `endpoint` using `request_timeout` per call.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidEndpoint`] when the endpoint cannot form
    /// a URL and [`ControlError::Client`] when the HTTP client cannot be built.
    pub fn new(endpoint: &ServiceEndpoint, request_timeout: Duration) -> Result<Self, ControlError> {
        let base =
            Url::parse(&endpoint.base_url()).map_err(|source| ControlError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })?;
        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("rclone-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ControlError::Client)?;
        Ok(Self {
            http,
            base,
            request_timeout,
        })
    }

    /// Base URL of the endpoint.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Calls `rc/noop` with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] when the server does not answer successfully.
    pub fn noop(&self, timeout: Duration) -> Result<(), ControlError> {
        self.call::<_, serde_json::Value>(NOOP_PATH, &Empty {}, timeout)
            .map(|_| ())
    }

    /// Version report of the server via `core/version`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Communication`] when the server is not
    /// reachable, other variants when it answers badly.
    pub fn version(&self) -> Result<VersionInfo, ControlError> {
        self.call(VERSION_PATH, &Empty {}, self.request_timeout)
    }

    /// Names of the configured backends via `config/listremotes`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] when the call fails.
    pub fn list_remotes(&self) -> Result<BTreeSet<String>, ControlError> {
        let list: RemoteList = self.call(LIST_REMOTES_PATH, &Empty {}, self.request_timeout)?;
        Ok(list.remotes.unwrap_or_default().into_iter().collect())
    }

    /// Registers a backend via `config/create`.
    ///
    /// rclone silently overwrites an existing backend, so the name is checked
    /// against `config/listremotes` first. That makes two round trips, and the
    /// check is not atomic with the create: another writer can add the same
    /// name in between and rclone will then overwrite it.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidName`] for names rclone would refuse,
    /// [`ControlError::AlreadyExists`] when the name is taken, and other
    /// variants when a call fails.
    pub fn config_create(&self, config: &BackendConfig) -> Result<(), ControlError> {
        validate_backend_name(config.name())?;
        if self.list_remotes()?.contains(config.name()) {
            return Err(ControlError::AlreadyExists {
                name: config.name().to_owned(),
            });
        }
        self.call::<_, serde_json::Value>(CONFIG_CREATE_PATH, config, self.request_timeout)?;
        debug!(
            target: CONTROL_TARGET,
            name = config.name(),
            backend_type = config.backend_type(),
            "backend created"
        );
        Ok(())
    }

    /// Removes a backend via `config/delete`.
    ///
    /// rclone accepts deletes of unknown names, so existence is checked
    /// against `config/listremotes` first. That makes two round trips; a
    /// backend removed by another writer in between is deleted again without
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidName`] for malformed names,
    /// [`ControlError::NotFound`] when no such backend exists, and other
    /// variants when a call fails.
    pub fn config_delete(&self, name: &str) -> Result<(), ControlError> {
        validate_backend_name(name)?;
        if !self.list_remotes()?.contains(name) {
            return Err(ControlError::NotFound {
                name: name.to_owned(),
            });
        }
        self.call::<_, serde_json::Value>(
            CONFIG_DELETE_PATH,
            &NamedBackend { name },
            self.request_timeout,
        )?;
        debug!(target: CONTROL_TARGET, name, "backend deleted");
        Ok(())
    }

    fn call<P, R>(&self, path: &str, params: &P, timeout: Duration) -> Result<R, ControlError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|source| ControlError::InvalidEndpoint {
                endpoint: self.base.to_string(),
                source,
            })?;
        debug!(target: CONTROL_TARGET, %url, "sending control request");
        let communication = |source| ControlError::Communication {
            path: path.to_owned(),
            source,
        };
        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(params)
            .send()
            .map_err(communication)?;
        let status = response.status();
        let body = response.text().map_err(communication)?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|error| error.error)
                .unwrap_or(body);
            debug!(
                target: CONTROL_TARGET,
                path,
                status = status.as_u16(),
                %message,
                "control request rejected"
            );
            return Err(ControlError::Protocol {
                path: path.to_owned(),
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|source| ControlError::MalformedResponse {
            path: path.to_owned(),
            source,
        })
    }
}
