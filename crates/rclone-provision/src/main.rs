//! Build-time entry point that installs rclone into a package directory.
//!
//! Reads `BUILD_RCLONE_VERSION`, `BUILD_SYSTEM`, `BUILD_ARCH` and the other
//! `BUILD_*` settings, installs the verified executable under
//! `<out_dir>/bin`, and reports the installed path and platform tag on
//! standard output.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    rclone_provision::run(std::env::args_os(), &mut stdout, &mut stderr)
}
