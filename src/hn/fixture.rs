// src/hn/fixture.rs
//! In-memory [`ItemSource`] for tests and offline demos.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::hn::types::{FetchError, Item, ItemSource};

#[derive(Debug, Default)]
pub struct StaticSource {
    ranked: Vec<u64>,
    items: HashMap<u64, Item>,
    failing: HashSet<u64>,
    fail_top: bool,
    delay: Duration,
    delays: HashMap<u64, Duration>,
    top_calls: AtomicUsize,
    item_calls: AtomicUsize,
}

impl StaticSource {
    /// Items are ranked in the order given.
    pub fn new(items: Vec<Item>) -> Self {
        let ranked = items.iter().map(|it| it.id).collect();
        let items = items.into_iter().map(|it| (it.id, it)).collect();
        Self {
            ranked,
            items,
            ..Self::default()
        }
    }

    /// Source whose ranked list fetch always fails.
    pub fn failing_top() -> Self {
        Self {
            fail_top: true,
            ..Self::default()
        }
    }

    /// Make `get_item` fail for these ids.
    pub fn with_failing(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.failing.extend(ids);
        self
    }

    /// Append ids to the ranked list that have no item body (unknown ids).
    pub fn with_unknown(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.ranked.extend(ids);
        self
    }

    /// Uniform latency added to every `get_item`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Per-id latency; overrides the uniform delay for those ids.
    pub fn with_delays(mut self, delays: HashMap<u64, Duration>) -> Self {
        self.delays = delays;
        self
    }

    pub fn top_calls(&self) -> usize {
        self.top_calls.load(Ordering::SeqCst)
    }

    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemSource for StaticSource {
    async fn top_items(&self) -> Result<Vec<u64>, FetchError> {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_top {
            return Err(FetchError::Other("top stories unavailable".into()));
        }
        Ok(self.ranked.clone())
    }

    async fn get_item(&self, id: u64) -> Result<Item, FetchError> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.get(&id).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&id) {
            return Err(FetchError::Other(format!("item {id} unavailable")));
        }
        self.items.get(&id).cloned().ok_or(FetchError::NotFound(id))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
