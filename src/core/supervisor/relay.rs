//! Signal relay.
//!
//! A single loop drains the termination-request channel and delivers each
//! request to the child, one at a time, in arrival order. Requests that
//! arrive after the child's exit has been observed are dropped.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::signal::unix::{signal as listen, SignalKind};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn, Instrument};

use super::TerminationRequest;

/// Signals the supervisor never relays: uncatchable ones, synchronous
/// faults that belong to the supervisor itself, and child-status
/// notifications.
const NOT_RELAYED: &[Signal] = &[
    Signal::SIGKILL,
    Signal::SIGSTOP,
    Signal::SIGILL,
    Signal::SIGFPE,
    Signal::SIGSEGV,
    Signal::SIGBUS,
    Signal::SIGTRAP,
    Signal::SIGSYS,
    Signal::SIGCHLD,
];

/// Whether `sig` is forwarded to the child when the supervisor receives it.
pub fn is_relayed(sig: Signal) -> bool {
    !NOT_RELAYED.contains(&sig)
}

/// Every signal [`listen_all`] subscribes to.
///
/// Real-time signals (`SIGRTMIN..=SIGRTMAX`) have no [`Signal`] variant and
/// are not relayed.
pub fn relayed_signals() -> impl Iterator<Item = Signal> {
    Signal::iterator().filter(|sig| is_relayed(*sig))
}

/// Something that can receive a signal.
pub trait SignalTarget {
    fn signal(&self, sig: Signal) -> nix::Result<()>;
}

impl SignalTarget for Pid {
    fn signal(&self, sig: Signal) -> nix::Result<()> {
        signal::kill(*self, sig)
    }
}

/// Subscribe to every relayed signal, feeding each delivery into
/// `requests` as [`TerminationRequest::Relay`].
///
/// Must be called from within a tokio runtime. Returns the number of
/// signals subscribed.
pub fn listen_all(requests: &mpsc::UnboundedSender<TerminationRequest>) -> usize {
    let mut subscribed = 0;

    for sig in relayed_signals() {
        let mut stream = match listen(SignalKind::from_raw(sig as i32)) {
            Ok(stream) => stream,
            Err(e) => {
                debug!(signal = sig.as_str(), error = %e, "signal cannot be relayed");
                continue;
            }
        };

        let requests = requests.clone();
        tokio::spawn(
            async move {
                while stream.recv().await.is_some() {
                    if requests.send(TerminationRequest::Relay(sig)).is_err() {
                        break;
                    }
                }
            }
            .in_current_span(),
        );
        subscribed += 1;
    }

    debug!(subscribed, "signal relay listening");
    subscribed
}

/// Forwards termination requests to the child until it exits.
pub struct SignalRelay {
    requests: mpsc::UnboundedReceiver<TerminationRequest>,
    exited: watch::Receiver<bool>,
}

impl SignalRelay {
    pub fn new(
        requests: mpsc::UnboundedReceiver<TerminationRequest>,
        exited: watch::Receiver<bool>,
    ) -> Self {
        Self { requests, exited }
    }

    /// Run until the child exits or every sender is gone.
    ///
    /// Returns the number of requests delivered.
    pub async fn run<T: SignalTarget>(self, target: T) -> usize {
        let Self {
            mut requests,
            mut exited,
        } = self;
        let mut delivered = 0;

        loop {
            let request = tokio::select! {
                biased;
                _ = exited.wait_for(|exited| *exited) => break,
                request = requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            // The child may have been reaped while this request was queued.
            if *exited.borrow() {
                break;
            }

            if deliver(&target, &request) {
                delivered += 1;
            }
        }

        debug!(delivered, "signal relay stopped");
        delivered
    }
}

fn deliver<T: SignalTarget>(target: &T, request: &TerminationRequest) -> bool {
    let sig = request.signal();

    if let Err(e) = target.signal(sig) {
        warn!(signal = sig.as_str(), error = %e, "failed to signal process");
        return false;
    }

    match request {
        TerminationRequest::Relay(Signal::SIGURG) => {
            debug!(signal = sig.as_str(), "received signal");
        }
        TerminationRequest::Relay(_) => info!(signal = sig.as_str(), "received signal"),
        TerminationRequest::LeaseExpired { path } | TerminationRequest::LeaseEscalated { path } => {
            info!(signal = sig.as_str(), path = %path, "delivered lease termination signal");
        }
    }
    true
}
