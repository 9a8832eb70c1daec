// src/cache/tracker.rs
//! Completion tracker: fires once when a building snapshot reaches the target.
//!
//! Advisory only. Workers already dispatched keep running after it fires.

use tokio::sync::oneshot;

use crate::cache::snapshot::Snapshot;

/// Start watching `building`. The returned receiver resolves with `Ok(())`
/// as soon as `building.len() >= target`. If the snapshot is dropped first
/// the sender goes away and the receiver resolves with an error.
pub fn spawn_tracker(building: &Snapshot, target: usize) -> oneshot::Receiver<()> {
    let mut len_rx = building.watch_len();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if len_rx.wait_for(|n| *n >= target).await.is_ok() {
            tracing::debug!(target: "refresh", target_count = target, "building snapshot is full");
            let _ = tx.send(());
        }
    });
    rx
}
