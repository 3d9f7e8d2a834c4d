//! Child process launch and supervision.
//!
//! Two mutually exclusive strategies:
//!
//! - **Replace** (default): the supervisor execs into the child and is gone.
//! - **Daemon**: the supervisor spawns the child, relays signals to it,
//!   terminates it when a watched lease dies, and mirrors its exit status.
//!
//! In daemon mode every party that wants the child signalled (the OS signal
//! listeners and each lease watcher) sends a [`TerminationRequest`] down one
//! channel. The relay loop is the only consumer.

mod relay;
mod replace;

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use nix::sys::signal::Signal;
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, Instrument};

use crate::core::environ::SanitizedEnviron;
use crate::error::{ProcessError, Result};

pub use relay::{is_relayed, listen_all, relayed_signals, SignalRelay, SignalTarget};
pub use replace::replace;

/// Exit status reported when the child's own status cannot be determined.
pub const INDETERMINATE_EXIT: i32 = -1;

/// A request to deliver a signal to the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationRequest {
    /// A signal the supervisor itself received.
    Relay(Signal),
    /// A watched lease ended; terminate gracefully.
    LeaseExpired { path: String },
    /// The child outlived the graceful termination timeout.
    LeaseEscalated { path: String },
}

impl TerminationRequest {
    /// Signal delivered for this request.
    pub fn signal(&self) -> Signal {
        match self {
            Self::Relay(sig) => *sig,
            Self::LeaseExpired { .. } => Signal::SIGTERM,
            Self::LeaseEscalated { .. } => Signal::SIGKILL,
        }
    }
}

/// Daemon-mode supervisor.
///
/// Created before secrets are injected so lease watchers can be wired to
/// [`Supervisor::requests`] and [`Supervisor::exit_watch`] ahead of the
/// child's start.
pub struct Supervisor {
    requests: mpsc::UnboundedSender<TerminationRequest>,
    inbox: mpsc::UnboundedReceiver<TerminationRequest>,
    exited_tx: watch::Sender<bool>,
    exited: watch::Receiver<bool>,
    relay_os_signals: bool,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        let (requests, inbox) = mpsc::unbounded_channel();
        let (exited_tx, exited) = watch::channel(false);

        Self {
            requests,
            inbox,
            exited_tx,
            exited,
            relay_os_signals: true,
        }
    }

    /// Disable subscription to OS signals. Queued requests are still
    /// delivered.
    pub fn without_os_signals(mut self) -> Self {
        self.relay_os_signals = false;
        self
    }

    /// Sender for termination requests.
    pub fn requests(&self) -> mpsc::UnboundedSender<TerminationRequest> {
        self.requests.clone()
    }

    /// Flips to `true` once the child's exit has been observed.
    pub fn exit_watch(&self) -> watch::Receiver<bool> {
        self.exited.clone()
    }

    /// Spawn `binary` with `args`, supervise it, and return the exit status
    /// the supervisor should mirror.
    ///
    /// The child inherits the supervisor's environment and standard streams;
    /// `environ` is applied on top.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::Spawn` if the child cannot be started. Every
    /// later failure is folded into the returned status.
    pub async fn run(
        self,
        binary: &Path,
        args: &[String],
        environ: &SanitizedEnviron<'_>,
    ) -> Result<i32> {
        let Self {
            requests,
            inbox,
            exited_tx,
            exited,
            relay_os_signals,
        } = self;

        if relay_os_signals {
            listen_all(&requests);
        }
        drop(requests);

        let mut child = Command::new(binary)
            .args(args)
            .envs(environ.vars_os())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                binary: binary.display().to_string(),
                source,
            })?;

        let Some(pid) = child.id() else {
            // Already reaped; nothing left to relay to.
            exited_tx.send_replace(true);
            return Ok(exit_code(child.wait().await));
        };
        debug!(pid, "process started");

        let relay = tokio::spawn(
            SignalRelay::new(inbox, exited)
                .run(Pid::from_raw(pid as i32))
                .in_current_span(),
        );

        let status = child.wait().await;
        exited_tx.send_replace(true);

        if let Err(e) = relay.await {
            debug!(error = %e, "signal relay ended abnormally");
        }

        Ok(exit_code(status))
    }
}

/// Map the child's wait result to the supervisor's exit status.
///
/// A normal exit yields the child's code. Termination by signal or a failed
/// wait yields [`INDETERMINATE_EXIT`].
pub fn exit_code(status: io::Result<ExitStatus>) -> i32 {
    match status {
        Ok(status) if status.success() => {
            info!("process exited");
            0
        }
        Ok(status) => match status.code() {
            Some(code) => {
                error!(code, "process exited with non-zero status");
                code
            }
            None => {
                let signal = status.signal().and_then(|s| Signal::try_from(s).ok());
                error!(signal = ?signal, "process terminated by signal");
                INDETERMINATE_EXIT
            }
        },
        Err(e) => {
            error!(error = %e, "failed to wait for process");
            INDETERMINATE_EXIT
        }
    }
}
