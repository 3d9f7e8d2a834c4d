//! Lease renewal watching.
//!
//! Ties a leased secret's lifetime to the child's. Each watched secret gets
//! its own [`LeaseWatcher`] task fed by a stream of [`LeaseEvent`]s:
//!
//! ```text
//! Watching ──renewed──▶ RenewalReceived ──▶ Watching
//!    │
//!    └──done──▶ [non-renewable: wait out the lease] ──▶ TerminationRequested
//!                                                          │ 10s, child alive
//!                                                          ▼
//!                                                       Escalated
//! ```
//!
//! Watchers only ever send [`TerminationRequest`]s; the signal relay does
//! the delivery. Every wait is abandoned as soon as the child exits.

mod timer;

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, Instrument};

use crate::core::constants;
use crate::core::inject::SecretRenewer;
use crate::core::secret::{LeasePhase, LeaseState, Secret};
use crate::core::supervisor::TerminationRequest;
use crate::error::Result;

pub use timer::TimerWatcherFactory;

/// Event emitted by a lease watch stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseEvent {
    /// The lease was renewed for `lease_duration`.
    Renewed { lease_duration: Duration },
    /// Renewal has stopped for good.
    Done { error: Option<String> },
}

/// Receiving end of a lease watch stream. Closing it counts as `Done`.
pub type LeaseEvents = mpsc::Receiver<LeaseEvent>;

/// Establishes lease watch streams.
pub trait LeaseWatcherFactory: Send + Sync {
    /// Start watching the lease of `secret`, fetched from `path`.
    ///
    /// # Errors
    ///
    /// Returns `LeaseError::WatcherSetup` if the stream cannot be set up.
    fn watch(&self, path: &str, secret: &Secret) -> Result<LeaseEvents>;
}

/// Per-secret lease state machine.
pub struct LeaseWatcher {
    state: LeaseState,
    events: LeaseEvents,
    requests: mpsc::UnboundedSender<TerminationRequest>,
    exited: watch::Receiver<bool>,
    kill_timeout: Duration,
}

impl LeaseWatcher {
    pub fn new(
        state: LeaseState,
        events: LeaseEvents,
        requests: mpsc::UnboundedSender<TerminationRequest>,
        exited: watch::Receiver<bool>,
    ) -> Self {
        Self {
            state,
            events,
            requests,
            exited,
            kill_timeout: constants::KILL_TIMEOUT,
        }
    }

    /// Override the graceful-to-forceful termination timeout.
    pub fn with_kill_timeout(mut self, timeout: Duration) -> Self {
        self.kill_timeout = timeout;
        self
    }

    /// Drive the state machine until it escalates or the child exits.
    ///
    /// Returns the final state.
    pub async fn run(self) -> LeaseState {
        let Self {
            mut state,
            mut events,
            requests,
            mut exited,
            kill_timeout,
        } = self;

        let done_error = loop {
            tokio::select! {
                biased;
                _ = exited.wait_for(|exited| *exited) => {
                    debug!(path = %state.path, "process exited, lease watch stopped");
                    return state;
                }
                event = events.recv() => match event {
                    Some(LeaseEvent::Renewed { lease_duration }) => {
                        state.phase = LeasePhase::RenewalReceived;
                        state.lease_duration = lease_duration;
                        info!(path = %state.path, lease_duration = ?lease_duration, "secret renewed");
                        state.phase = LeasePhase::Watching;
                    }
                    Some(LeaseEvent::Done { error }) => break error,
                    None => break None,
                },
            }
        };

        // A non-renewable secret stays usable until its lease runs out.
        if !state.renewable {
            if !sleep_while_running(&mut exited, state.lease_duration).await {
                return state;
            }
            info!(path = %state.path, lease_duration = ?state.lease_duration, "secret lease has expired");
        }

        info!(
            path = %state.path,
            done_error = done_error.as_deref().unwrap_or(""),
            "secret renewal has stopped, sending SIGTERM to process"
        );
        state.phase = LeasePhase::TerminationRequested;
        let expired = TerminationRequest::LeaseExpired {
            path: state.path.clone(),
        };
        if requests.send(expired).is_err() {
            return state;
        }

        if !sleep_while_running(&mut exited, kill_timeout).await {
            return state;
        }

        info!(path = %state.path, timeout = ?kill_timeout, "killing process due to SIGTERM timeout");
        state.phase = LeasePhase::Escalated;
        let _ = requests.send(TerminationRequest::LeaseEscalated {
            path: state.path.clone(),
        });

        state
    }
}

/// Sleep for `duration` unless the child exits first.
///
/// Returns `true` if the full duration elapsed with the child still running.
async fn sleep_while_running(exited: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = exited.wait_for(|exited| *exited) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// [`SecretRenewer`] that spawns one [`LeaseWatcher`] per leased secret.
pub struct DaemonSecretRenewer {
    factory: Arc<dyn LeaseWatcherFactory>,
    requests: mpsc::UnboundedSender<TerminationRequest>,
    exited: watch::Receiver<bool>,
    handle: Handle,
}

impl DaemonSecretRenewer {
    pub fn new(
        factory: Arc<dyn LeaseWatcherFactory>,
        requests: mpsc::UnboundedSender<TerminationRequest>,
        exited: watch::Receiver<bool>,
        handle: Handle,
    ) -> Self {
        Self {
            factory,
            requests,
            exited,
            handle,
        }
    }
}

impl SecretRenewer for DaemonSecretRenewer {
    fn renew(&self, path: &str, secret: &Secret) -> Result<()> {
        let events = self.factory.watch(path, secret)?;

        debug!(
            path,
            renewable = secret.renewable,
            lease_duration = secret.lease_duration,
            "watching secret lease"
        );

        let watcher = LeaseWatcher::new(
            LeaseState::new(path, secret),
            events,
            self.requests.clone(),
            self.exited.clone(),
        );
        self.handle.spawn(watcher.run().in_current_span());

        Ok(())
    }
}
