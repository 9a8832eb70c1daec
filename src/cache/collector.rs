// src/cache/collector.rs
//! Collection worker: fetch one ranked id, keep it if it is a link story.

use metrics::counter;

use crate::cache::snapshot::Snapshot;
use crate::cache::story::{is_story_link, Story};
use crate::hn::ItemSource;

/// What a single worker did. Fetch errors are absorbed here and only show
/// up as `Failed`; they never abort the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collected {
    Appended,
    /// The building snapshot already held `target` stories.
    Full,
    /// Fetched, but not a link story.
    Skipped,
    Failed,
}

pub async fn collect_story(
    order: usize,
    id: u64,
    source: &dyn ItemSource,
    building: &Snapshot,
    target: usize,
) -> Collected {
    // Cheap early exit; the authoritative check is push_bounded below.
    if building.len() >= target {
        return Collected::Full;
    }

    let item = match source.get_item(id).await {
        Ok(item) => item,
        Err(e) => {
            tracing::debug!(target: "refresh", id, order, error = %e, "item fetch failed, skipping");
            counter!("refresh_item_errors_total").increment(1);
            return Collected::Failed;
        }
    };
    counter!("refresh_items_fetched_total").increment(1);

    if !is_story_link(&item) {
        return Collected::Skipped;
    }

    if building.push_bounded(Story::new(item, order), target) {
        Collected::Appended
    } else {
        Collected::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hn::{Item, StaticSource};

    #[tokio::test]
    async fn appends_link_story_with_rank_and_host() {
        let src = StaticSource::new(vec![Item::new(7, "story", "A", "https://www.example.com/a")]);
        let snap = Snapshot::new();
        let got = collect_story(12, 7, &src, &snap, 30).await;
        assert_eq!(got, Collected::Appended);
        let stories = snap.stories();
        assert_eq!(stories[0].order, 12);
        assert_eq!(stories[0].host, "example.com");
    }

    #[tokio::test]
    async fn skips_comments_and_absorbs_errors() {
        let src = StaticSource::new(vec![Item::new(1, "comment", "", "https://example.com")])
            .with_failing([2])
            .with_unknown([3]);
        let snap = Snapshot::new();
        assert_eq!(collect_story(0, 1, &src, &snap, 30).await, Collected::Skipped);
        assert_eq!(collect_story(1, 2, &src, &snap, 30).await, Collected::Failed);
        assert_eq!(collect_story(2, 3, &src, &snap, 30).await, Collected::Failed);
        assert!(snap.is_empty());
    }

    #[tokio::test]
    async fn full_snapshot_short_circuits_before_fetch() {
        let src = StaticSource::new(vec![
            Item::new(1, "story", "A", "https://a.example"),
            Item::new(2, "story", "B", "https://b.example"),
        ]);
        let snap = Snapshot::new();
        assert_eq!(collect_story(0, 1, &src, &snap, 1).await, Collected::Appended);
        assert_eq!(collect_story(1, 2, &src, &snap, 1).await, Collected::Full);
        assert_eq!(src.item_calls(), 1);
        assert_eq!(snap.len(), 1);
    }
}
