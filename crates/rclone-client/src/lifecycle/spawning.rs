//! Launching `rclone rcd`.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::LIFECYCLE_TARGET;
use super::error::LifecycleError;
use crate::options::ClientOptions;

/// Command-line arguments for the remote-control server.
///
/// Authentication is disabled because the listener is meant for the owning
/// process only; bind it to a loopback address.
pub(crate) fn rcd_arguments(options: &ClientOptions) -> Vec<OsString> {
    let mut arguments: Vec<OsString> = vec![
        OsString::from("rcd"),
        OsString::from("--rc-addr"),
        OsString::from(options.endpoint().rc_addr()),
        OsString::from("--rc-no-auth"),
    ];
    if let Some(config_file) = options.config_file() {
        arguments.push(OsString::from("--config"));
        arguments.push(config_file.as_os_str().to_owned());
    }
    if let Some(log_file) = options.log_file() {
        arguments.push(OsString::from("--log-file"));
        arguments.push(log_file.as_os_str().to_owned());
    }
    arguments
}

/// Spawns the server with detached or inherited standard streams.
pub(crate) fn spawn_rcd(options: &ClientOptions) -> Result<Child, LifecycleError> {
    let binary: PathBuf = options.binary().path().to_path_buf();
    let arguments = rcd_arguments(options);
    debug!(
        target: LIFECYCLE_TARGET,
        binary = %binary.display(),
        args = ?arguments,
        "spawning rclone"
    );

    let mut command = Command::new(&binary);
    command.args(&arguments).stdin(Stdio::null());
    if options.inherit_output() {
        command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }
    command
        .spawn()
        .map_err(|source| LifecycleError::Spawn { binary, source })
}
