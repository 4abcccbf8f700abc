// ── Background poller ──
//
// Drives `update()` on a set of device views at a fixed interval. Failures
// are logged and the loop carries on. Timeouts and refused connections are
// expected on flaky links and log below warning level. The outcome of every tick is
// published on a watch channel for consumers that want to react to it.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::device::Device;

/// Outcome of one polling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Number of completed passes; 0 before the first one.
    pub tick: u64,
    pub updated: usize,
    pub failed: usize,
}

/// Handle to a running poll task.
#[derive(Debug)]
pub struct Poller {
    summary: watch::Receiver<PollSummary>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling `devices` every `interval`. The first pass runs one
    /// full interval after spawning. Cancelling `cancel` stops the task.
    pub fn spawn(devices: Vec<Device>, interval: Duration, cancel: CancellationToken) -> Self {
        let (tx, summary) = watch::channel(PollSummary::default());
        let handle = tokio::spawn(poll_task(devices, interval, cancel.clone(), tx));

        Self {
            summary,
            cancel,
            handle,
        }
    }

    /// A receiver that observes every published summary.
    pub fn subscribe(&self) -> watch::Receiver<PollSummary> {
        self.summary.clone()
    }

    /// The most recent summary.
    pub fn latest(&self) -> PollSummary {
        *self.summary.borrow()
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "poll task ended abnormally");
        }
    }
}

/// Update every device once, sequentially.
pub async fn poll_once(devices: &[Device], tick: u64) -> PollSummary {
    let mut summary = PollSummary {
        tick,
        ..PollSummary::default()
    };

    for device in devices {
        match device.update().await {
            Ok(()) => summary.updated += 1,
            Err(e) if e.is_transient() => {
                summary.failed += 1;
                info!(
                    kind = %device.kind(),
                    id = device.id(),
                    error = %e,
                    "device unreachable, retrying next tick"
                );
            }
            Err(e) => {
                summary.failed += 1;
                warn!(
                    kind = %device.kind(),
                    id = device.id(),
                    error = %e,
                    "failed to update device"
                );
            }
        }
    }

    summary
}

async fn poll_task(
    devices: Vec<Device>,
    period: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<PollSummary>,
) {
    // tokio panics on a zero period
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    let mut tick = 0;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tick += 1;
                let summary = poll_once(&devices, tick).await;
                debug!(tick, updated = summary.updated, failed = summary.failed, "poll complete");
                tx.send_replace(summary);
            }
        }
    }

    debug!("poller stopped");
}
