// src/hn/mod.rs
//! Ranked-item source: the trait the refresh pipeline depends on, plus the
//! Hacker News HTTP client and an in-memory source for tests and demos.

pub mod client;
pub mod fixture;
pub mod types;

pub use client::HnClient;
pub use fixture::StaticSource;
pub use types::{FetchError, Item, ItemSource};
