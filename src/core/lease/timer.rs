//! Clock-driven lease watch streams for the local secret store.
//!
//! The local store has no server to renew against, so renewals are simulated
//! on a schedule: a renewable lease is renewed after two thirds of its
//! duration until renewing again would run past `max_ttl`.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::{LeaseEvent, LeaseEvents, LeaseWatcherFactory};
use crate::core::secret::Secret;
use crate::error::{LeaseError, Result};

/// Produces timer-driven lease event streams.
pub struct TimerWatcherFactory {
    handle: Handle,
}

impl TimerWatcherFactory {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl LeaseWatcherFactory for TimerWatcherFactory {
    fn watch(&self, path: &str, secret: &Secret) -> Result<LeaseEvents> {
        if !secret.is_leased() {
            return Err(LeaseError::WatcherSetup {
                path: path.to_string(),
                reason: "secret has no lease".to_string(),
            }
            .into());
        }

        let (tx, rx) = mpsc::channel(4);
        self.handle.spawn(
            drive(
                tx,
                secret.lease(),
                secret.renewable,
                Duration::from_secs(secret.max_ttl),
            )
            .in_current_span(),
        );
        Ok(rx)
    }
}

async fn drive(tx: mpsc::Sender<LeaseEvent>, lease: Duration, renewable: bool, max_ttl: Duration) {
    if !renewable {
        let _ = tx
            .send(LeaseEvent::Done {
                error: Some("secret is not renewable".to_string()),
            })
            .await;
        return;
    }

    let interval = lease * 2 / 3;
    let mut elapsed = Duration::ZERO;

    loop {
        if !max_ttl.is_zero() && elapsed + interval + lease > max_ttl {
            let remaining = max_ttl.saturating_sub(elapsed);
            if !sleep_while_open(&tx, remaining).await {
                return;
            }
            let _ = tx.send(LeaseEvent::Done { error: None }).await;
            return;
        }

        if !sleep_while_open(&tx, interval).await {
            return;
        }
        elapsed += interval;

        if tx.send(LeaseEvent::Renewed { lease_duration: lease }).await.is_err() {
            return;
        }
    }
}

/// Sleep unless the watcher hangs up first.
async fn sleep_while_open(tx: &mpsc::Sender<LeaseEvent>, duration: Duration) -> bool {
    tokio::select! {
        _ = tx.closed() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
