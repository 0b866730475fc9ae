//! Periodic presence jobs: TTL sweep and persistence flush.
//!
//! Both loops tick on fixed intervals and stop when the shared shutdown
//! signal flips.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

use crate::tracker::PresenceTracker;

/// Spawn the TTL sweep and flush loops for a tracker.
///
/// Returns the join handles; the loops exit when `shutdown` becomes
/// `true`.
pub fn spawn_presence_loops(
    tracker: Arc<PresenceTracker>,
    sweep_interval: Duration,
    flush_interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let sweep_handle = tokio::spawn(run_sweep_loop(
        tracker.clone(),
        sweep_interval,
        shutdown.clone(),
    ));
    let flush_handle = tokio::spawn(run_flush_loop(tracker, flush_interval, shutdown));
    (sweep_handle, flush_handle)
}

/// TTL sweep loop — demotes devices that went silent.
async fn run_sweep_loop(
    tracker: Arc<PresenceTracker>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracker.sweep();
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Presence sweep loop stopped");
}

/// Flush loop — persists presence snapshots on a fixed cadence.
async fn run_flush_loop(
    tracker: Arc<PresenceTracker>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracker.flush().await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Presence flush loop stopped");
}
