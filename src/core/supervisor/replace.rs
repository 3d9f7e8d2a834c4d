//! Process image replacement.

use std::convert::Infallible;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::core::environ::SanitizedEnviron;
use crate::error::{ProcessError, Result};

/// Replace the current process image with `binary`.
///
/// `command` is the full argument vector, `command[0]` included. The child
/// sees exactly `environ` and nothing else. Only returns on failure; on
/// success the child takes over this process's PID and signal dispositions.
///
/// # Errors
///
/// Returns `ProcessError::Exec` if the exec call fails.
pub fn replace(binary: &Path, command: &[String], environ: &SanitizedEnviron<'_>) -> Result<Infallible> {
    let mut cmd = Command::new(binary);
    if let Some((argv0, args)) = command.split_first() {
        cmd.arg0(argv0).args(args);
    }
    cmd.env_clear().envs(environ.vars_os());

    debug!(binary = %binary.display(), vars = environ.vars_os().count(), "replacing process image");
    let source = cmd.exec();

    Err(ProcessError::Exec {
        binary: binary.display().to_string(),
        source,
    }
    .into())
}
