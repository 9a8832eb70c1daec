// src/cache/snapshot.rs
//! Snapshot holder: an ordered story list behind one exclusive lock.
//!
//! Every operation, reads included, takes the same `Mutex`, so a reader sees
//! either the contents before a publish or after it, never a mix. The current
//! length is mirrored into a `watch` channel so the completion tracker can
//! wait for a threshold without polling.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::cache::story::Story;

#[derive(Debug, Default)]
struct Inner {
    stories: Vec<Story>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct Snapshot {
    inner: Mutex<Inner>,
    len_tx: watch::Sender<usize>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot {
    pub fn new() -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner::default()),
            len_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking writer cannot leave a half-pushed Vec behind, so the data is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.stories = Vec::new();
        inner.published_at = None;
        self.len_tx.send_replace(0);
    }

    /// Copy of the current contents.
    pub fn stories(&self) -> Vec<Story> {
        self.lock().stories.clone()
    }

    /// Contents plus the time they were published, read under one lock.
    pub fn read(&self) -> (Vec<Story>, Option<DateTime<Utc>>) {
        let inner = self.lock();
        (inner.stories.clone(), inner.published_at)
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.lock().published_at
    }

    pub fn push(&self, story: Story) {
        let mut inner = self.lock();
        inner.stories.push(story);
        self.len_tx.send_replace(inner.stories.len());
    }

    /// Append only while fewer than `cap` stories are held. The check and
    /// the append happen under the same lock, so `len() <= cap` always holds
    /// for stories added this way.
    pub fn push_bounded(&self, story: Story, cap: usize) -> bool {
        let mut inner = self.lock();
        if inner.stories.len() >= cap {
            return false;
        }
        inner.stories.push(story);
        self.len_tx.send_replace(inner.stories.len());
        true
    }

    pub fn sort_by_order(&self) {
        // sort_by_key is stable
        self.lock().stories.sort_by_key(|s| s.order);
    }

    /// Replace this holder's contents wholesale with a copy of `other`'s.
    pub fn replace_from(&self, other: &Snapshot) {
        if std::ptr::eq(self, other) {
            return;
        }
        let fresh = other.stories();
        self.install(fresh);
    }

    /// Sort this snapshot by rank and publish a copy into `target`, holding
    /// this snapshot's lock throughout so no late append lands in between.
    /// Returns the number of stories published.
    pub fn publish_sorted_into(&self, target: &Snapshot) -> usize {
        if std::ptr::eq(self, target) {
            self.sort_by_order();
            return self.len();
        }
        let mut src = self.lock();
        src.stories.sort_by_key(|s| s.order);
        let fresh = src.stories.clone();
        let n = fresh.len();
        target.install(fresh);
        n
    }

    fn install(&self, stories: Vec<Story>) {
        let mut inner = self.lock();
        inner.stories = stories;
        inner.published_at = Some(Utc::now());
        self.len_tx.send_replace(inner.stories.len());
    }

    /// Receiver that observes every length change.
    pub fn watch_len(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hn::Item;

    fn story(id: u64, order: usize) -> Story {
        Story::new(Item::new(id, "story", "t", "https://example.com"), order)
    }

    #[test]
    fn push_bounded_stops_at_cap() {
        let s = Snapshot::new();
        assert!(s.push_bounded(story(1, 0), 2));
        assert!(s.push_bounded(story(2, 1), 2));
        assert!(!s.push_bounded(story(3, 2), 2));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn publish_sorts_and_copies_wholesale() {
        let building = Snapshot::new();
        building.push(story(30, 7));
        building.push(story(10, 0));
        building.push(story(20, 3));

        let served = Snapshot::new();
        served.push(story(99, 0));
        assert!(served.published_at().is_none());

        let n = building.publish_sorted_into(&served);
        assert_eq!(n, 3);
        let orders: Vec<usize> = served.stories().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 3, 7]);
        assert!(served.published_at().is_some());
    }

    #[test]
    fn replace_from_then_clear() {
        let a = Snapshot::new();
        a.push(story(1, 0));
        let b = Snapshot::new();
        b.replace_from(&a);
        assert_eq!(b.stories(), a.stories());

        b.clear();
        assert!(b.is_empty());
        assert!(b.published_at().is_none());
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn replace_from_self_is_noop() {
        let a = Snapshot::new();
        a.push(story(1, 0));
        a.replace_from(&a);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn watch_tracks_length() {
        let s = Snapshot::new();
        let rx = s.watch_len();
        s.push(story(1, 0));
        s.push(story(2, 1));
        assert_eq!(*rx.borrow(), 2);
        s.clear();
        assert_eq!(*rx.borrow(), 0);
    }
}
