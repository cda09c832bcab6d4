//! The reachability polling task and its handle.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::probe::Probe;

/// Whether the backend was reachable at the last check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReachabilityState {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Online,
    Offline,
}

/// Latest reachability status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reachability {
    pub state: ReachabilityState,
    /// When the last probe completed.
    pub checked_at: Option<DateTime<Utc>>,
    /// When `state` last changed.
    pub changed_at: Option<DateTime<Utc>>,
}

impl Reachability {
    /// Whether the last probe reached the backend.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.state == ReachabilityState::Online
    }

    /// Record a probe result. Returns `true` if the state changed.
    fn record(&mut self, online: bool, now: DateTime<Utc>) -> bool {
        let next = if online {
            ReachabilityState::Online
        } else {
            ReachabilityState::Offline
        };
        self.checked_at = Some(now);
        if self.state == next {
            return false;
        }
        self.state = next;
        self.changed_at = Some(now);
        true
    }
}

/// Starts reachability polling tasks.
#[derive(Debug)]
pub struct ReachabilityMonitor;

impl ReachabilityMonitor {
    /// Shortest accepted polling interval. Shorter ones are raised to it.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// Spawn a task that runs `probe` every `interval`, starting immediately.
    ///
    /// `interval` is raised to [`Self::MIN_INTERVAL`] if shorter.
    /// Must be called from within a Tokio runtime.
    #[must_use = "dropping the handle stops the monitor"]
    pub fn start<P, C>(probe: P, clock: C, interval: Duration) -> MonitorHandle
    where
        P: Probe,
        C: Clock,
    {
        if interval < Self::MIN_INTERVAL {
            warn!(
                requested_ms = interval.as_millis(),
                min_ms = Self::MIN_INTERVAL.as_millis(),
                "Reachability interval too short, using minimum"
            );
        }
        let interval = interval.max(Self::MIN_INTERVAL);
        let (status_tx, status_rx) = watch::channel(Reachability::default());
        let (stop_tx, stop_rx) = oneshot::channel();

        info!(interval_ms = interval.as_millis(), "Starting reachability monitor");
        let task = tokio::spawn(run(probe, clock, interval, status_tx, stop_rx));

        MonitorHandle {
            status: status_rx,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

async fn run<P: Probe, C: Clock>(
    probe: P,
    clock: C,
    interval: Duration,
    status: watch::Sender<Reachability>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let online = probe.check().await;
                let now = clock.now();
                let changed = status.send_if_modified(|s| s.record(online, now));
                if changed {
                    if online {
                        info!("Backend reachable");
                    } else {
                        warn!("Backend unreachable");
                    }
                } else {
                    debug!(online, "Reachability unchanged");
                }
            }
        }
    }

    info!("Reachability monitor stopped");
}

/// Owner of a running reachability monitor.
///
/// Dropping the handle aborts the task; [`MonitorHandle::stop`] shuts it
/// down gracefully.
#[derive(Debug)]
pub struct MonitorHandle {
    status: watch::Receiver<Reachability>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Latest status. `checked_at` reflects every probe, not just changes.
    #[must_use]
    pub fn current(&self) -> Reachability {
        *self.status.borrow()
    }

    /// Receiver notified whenever the state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Reachability> {
        self.status.clone()
    }

    /// Whether the polling task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop polling and wait for the task to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Reachability monitor task ended abnormally");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
