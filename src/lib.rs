// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod hn;
pub mod metrics;
pub mod render;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::{CycleOutcome, RefreshConfig, Refresher, Snapshot, Story};
pub use crate::hn::{FetchError, HnClient, Item, ItemSource};
