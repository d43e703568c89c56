//! Test support for supervision and control coverage.
//!
//! Pairs a fake remote-control server with a shell stand-in for the rclone
//! executable. The stand-in never listens itself, so clients built here skip
//! the "endpoint already in use" check and talk to the fake instead.

mod fake_rc;
#[cfg(unix)]
mod standin;

use std::net::TcpListener;
use std::time::Duration;

use anyhow::{Context, Result};
use rclone_config::ServiceEndpoint;

use crate::binary::InstalledBinary;
use crate::client::RcloneClient;
use crate::options::ClientOptions;

pub(super) use fake_rc::{FAKE_VERSION, FakeRc};
#[cfg(unix)]
pub(super) use standin::{Behaviour, StandIn};

/// Options with timeouts short enough for tests.
pub(super) fn quick_options(endpoint: ServiceEndpoint, binary: InstalledBinary) -> ClientOptions {
    ClientOptions::new(endpoint, binary)
        .with_endpoint_check(false)
        .with_request_timeout(Duration::from_secs(2))
        .with_probe_timeout(Duration::from_millis(250))
        .with_shutdown_grace(Duration::from_millis(500))
}

/// Client launching `binary` and talking to `endpoint`.
pub(super) fn client_for(endpoint: ServiceEndpoint, binary: InstalledBinary) -> Result<RcloneClient> {
    RcloneClient::new(quick_options(endpoint, binary)).context("build client")
}

/// Loopback endpoint on which nothing listens.
pub(super) fn closed_endpoint() -> Result<ServiceEndpoint> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind probe listener")?;
    let port = listener.local_addr().context("local addr")?.port();
    drop(listener);
    Ok(ServiceEndpoint::new("127.0.0.1", port))
}
