//! Shell scripts standing in for the rclone executable.
//!
//! Each launch appends its pid to `spawns.log` and its arguments to
//! `args.log` next to the script, so tests can count spawns and inspect the
//! command line without a real rclone.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::binary::{BIN_DIR, InstalledBinary, binary_name};

const SPAWN_LOG: &str = "spawns.log";
const ARGS_LOG: &str = "args.log";

/// Behaviour of the stand-in once launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::tests) enum Behaviour {
    /// Keeps running until signalled.
    Serve,
    /// Ignores SIGTERM and keeps running.
    IgnoreTerm,
    /// Exits immediately with the given code.
    Exit(i32),
}

impl Behaviour {
    fn tail(self) -> String {
        match self {
            Self::Serve => "exec sleep 60".to_owned(),
            Self::IgnoreTerm => "trap '' TERM\nwhile true; do sleep 1; done".to_owned(),
            Self::Exit(code) => format!("exit {code}"),
        }
    }
}

/// Package directory holding a stand-in at `bin/rclone`.
pub(in crate::tests) struct StandIn {
    root: TempDir,
}

impl StandIn {
    /// Installs a stand-in with `behaviour` into a fresh package directory.
    pub fn install(behaviour: Behaviour) -> Result<Self> {
        let root = TempDir::new().context("package dir")?;
        let bin = root.path().join(BIN_DIR);
        fs::create_dir_all(&bin).context("bin dir")?;
        let script = format!(
            "#!/bin/sh\necho $$ >> '{spawns}'\nprintf '%s\\n' \"$@\" >> '{args}'\n{tail}\n",
            spawns = bin.join(SPAWN_LOG).display(),
            args = bin.join(ARGS_LOG).display(),
            tail = behaviour.tail(),
        );
        let path = bin.join(binary_name());
        fs::write(&path, script).context("write stand-in")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).context("chmod stand-in")?;
        Ok(Self { root })
    }

    /// Package root.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Installed stand-in.
    pub fn binary(&self) -> InstalledBinary {
        InstalledBinary::in_package(self.root.path())
    }

    /// Number of times the stand-in has been launched.
    pub fn spawn_count(&self) -> usize {
        self.read_log(SPAWN_LOG).lines().count()
    }

    /// Waits up to two seconds for at least `expected` launches to be logged.
    pub fn wait_for_spawns(&self, expected: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let count = self.spawn_count();
            if count >= expected || Instant::now() >= deadline {
                return count;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Arguments received across all launches, one per line.
    pub fn arguments(&self) -> Vec<String> {
        self.read_log(ARGS_LOG).lines().map(str::to_owned).collect()
    }

    fn log_path(&self, name: &str) -> PathBuf {
        self.root.path().join(BIN_DIR).join(name)
    }

    fn read_log(&self, name: &str) -> String {
        fs::read_to_string(self.log_path(name)).unwrap_or_default()
    }
}
