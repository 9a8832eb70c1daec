// src/cache/mod.rs
//! Background story cache: classification, snapshots, collection workers,
//! completion tracking and the refresh loop that ties them together.

pub mod collector;
pub mod refresh;
pub mod snapshot;
pub mod story;
pub mod tracker;

pub use refresh::{CycleOutcome, RefreshConfig, Refresher};
pub use snapshot::Snapshot;
pub use story::Story;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "refresh_cycles_total",
            "Refresh cycles by outcome (published, timed_out, source_failed)."
        );
        describe_counter!(
            "refresh_items_fetched_total",
            "Item bodies fetched from the source."
        );
        describe_counter!(
            "refresh_item_errors_total",
            "Item fetches that failed and were skipped."
        );
        describe_gauge!(
            "refresh_stories_published",
            "Stories in the most recently published snapshot."
        );
        describe_histogram!("refresh_cycle_ms", "Refresh cycle duration in milliseconds.");
    });
}
