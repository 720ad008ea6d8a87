//! Filtering of already-fetched featured listings.
//!
//! The listing exists twice: a flat list of topics and per-category id
//! lists pointing at the same topics. Both are rebuilt from one pass over
//! one blocked set, so after filtering every category entry refers to a
//! topic still in the flat list.

use std::collections::HashSet;
use tracing::debug;

use tag_gating_types::{
    ConfigSnapshot, ContentId, FeaturedListing, StoreError, TagStore, Viewer,
};

use crate::policy::AccessPolicy;
use crate::tag_index::TagIndex;

pub struct FeaturedListFilter<'a, S: TagStore + ?Sized> {
    snapshot: &'a ConfigSnapshot,
    store: &'a S,
}

impl<'a, S: TagStore + ?Sized> FeaturedListFilter<'a, S> {
    pub fn new(snapshot: &'a ConfigSnapshot, store: &'a S) -> Self {
        Self { snapshot, store }
    }

    /// Remove gated topics from both views in place.
    pub async fn apply(
        &self,
        listing: &mut FeaturedListing,
        viewer: &Viewer,
    ) -> Result<(), StoreError> {
        let rule = match self.snapshot.rule() {
            Some(rule) => rule,
            None => return Ok(()),
        };
        if listing.is_empty() || AccessPolicy::new(rule).evaluate(viewer) {
            return Ok(());
        }

        // Only ask about what is on screen.
        let blocked = TagIndex::new(self.store, rule)
            .blocked_ids_among(viewer, listing.content_ids())
            .await?;

        // Prune even when nothing is blocked: category entries must point
        // into the flat list.
        let removed = retain_unblocked(listing, &blocked);
        debug!(viewer = %viewer, removed, "Gated topics removed from featured listing");
        Ok(())
    }
}

/// One pass: filter the flat list, then keep only category entries that
/// still point into it. Returns how many flat entries were removed.
fn retain_unblocked(listing: &mut FeaturedListing, blocked: &HashSet<ContentId>) -> usize {
    let before = listing.topics.len();
    listing.topics.retain(|topic| !blocked.contains(&topic.id));

    let surviving: HashSet<ContentId> = listing.topics.iter().map(|t| t.id).collect();
    for ids in listing.category_topic_ids.values_mut() {
        ids.retain(|id| surviving.contains(id));
    }
    before - listing.topics.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rule, MockTagStore};
    use tag_gating_types::{CategoryId, Content, Identity, ViewerId};

    fn store() -> MockTagStore {
        MockTagStore::new()
            .topic(1, Some(10), &["restricted"])
            .topic(2, Some(20), &["general"])
            .topic(3, Some(30), &["restricted"])
            .topic(4, Some(40), &[])
            .topic(99, Some(50), &["restricted"])
    }

    fn sample_listing() -> FeaturedListing {
        FeaturedListing::from_topics(vec![
            Content::new(ContentId(1), Some(ViewerId(10))).in_category(CategoryId(1)),
            Content::new(ContentId(2), Some(ViewerId(20))).in_category(CategoryId(1)),
            Content::new(ContentId(3), Some(ViewerId(30))).in_category(CategoryId(2)),
            Content::new(ContentId(4), Some(ViewerId(40))),
        ])
    }

    fn flat(listing: &FeaturedListing) -> Vec<i64> {
        listing.topics.iter().map(|t| t.id.0).collect()
    }

    #[tokio::test]
    async fn removes_from_both_views() {
        let store = store();
        let snapshot = ConfigSnapshot::Enforced(rule());
        let mut listing = sample_listing();
        FeaturedListFilter::new(&snapshot, &store)
            .apply(&mut listing, &Viewer::Anonymous)
            .await
            .unwrap();

        assert_eq!(flat(&listing), vec![2, 4]);
        assert_eq!(listing.category_topic_ids[&CategoryId(1)], vec![ContentId(2)]);
        assert!(listing.category_topic_ids[&CategoryId(2)].is_empty());
        assert!(listing.views_agree());
        assert_eq!(store.blocked_lookups(), 1);
    }

    #[tokio::test]
    async fn owner_keeps_own_topic() {
        let store = store();
        let snapshot = ConfigSnapshot::Enforced(rule());
        let mut listing = sample_listing();
        let owner = Viewer::user(Identity::new(ViewerId(30)).with_attribute("7", "false"));
        FeaturedListFilter::new(&snapshot, &store)
            .apply(&mut listing, &owner)
            .await
            .unwrap();
        assert_eq!(flat(&listing), vec![2, 3, 4]);
        assert_eq!(listing.category_topic_ids[&CategoryId(2)], vec![ContentId(3)]);
    }

    #[tokio::test]
    async fn dangling_category_reference_is_dropped() {
        let store = store();
        let snapshot = ConfigSnapshot::Enforced(rule());
        let mut listing = sample_listing();
        listing
            .category_topic_ids
            .get_mut(&CategoryId(1))
            .unwrap()
            .push(ContentId(99));
        FeaturedListFilter::new(&snapshot, &store)
            .apply(&mut listing, &Viewer::Anonymous)
            .await
            .unwrap();
        assert!(listing.views_agree());
        assert!(!listing.content_ids().contains(&ContentId(99)));
    }

    #[tokio::test]
    async fn ungated_dangling_reference_is_dropped() {
        let store = store();
        let snapshot = ConfigSnapshot::Enforced(rule());
        let mut listing = FeaturedListing::from_topics(vec![
            Content::new(ContentId(2), Some(ViewerId(20))).in_category(CategoryId(1)),
        ]);
        listing
            .category_topic_ids
            .get_mut(&CategoryId(1))
            .unwrap()
            .push(ContentId(77));

        FeaturedListFilter::new(&snapshot, &store)
            .apply(&mut listing, &Viewer::Anonymous)
            .await
            .unwrap();

        assert!(listing.views_agree());
        assert_eq!(flat(&listing), vec![2]);
        assert_eq!(listing.category_topic_ids[&CategoryId(1)], vec![ContentId(2)]);
        assert_eq!(store.blocked_lookups(), 1);
    }

    #[tokio::test]
    async fn entitled_and_disabled_are_no_ops() {
        let store = store();
        let entitled = Viewer::user(Identity::new(ViewerId(5)).with_attribute("7", "true"));

        let snapshot = ConfigSnapshot::Enforced(rule());
        let mut listing_a = sample_listing();
        FeaturedListFilter::new(&snapshot, &store)
            .apply(&mut listing_a, &entitled)
            .await
            .unwrap();
        assert_eq!(listing_a, sample_listing());

        let disabled = ConfigSnapshot::Disabled;
        let mut listing_b = sample_listing();
        FeaturedListFilter::new(&disabled, &store)
            .apply(&mut listing_b, &Viewer::Anonymous)
            .await
            .unwrap();
        assert_eq!(listing_b, sample_listing());
        assert_eq!(store.blocked_lookups(), 0);
    }

    #[tokio::test]
    async fn empty_listing_skips_the_store() {
        let store = store();
        let snapshot = ConfigSnapshot::Enforced(rule());
        let mut listing = FeaturedListing::default();
        FeaturedListFilter::new(&snapshot, &store)
            .apply(&mut listing, &Viewer::Anonymous)
            .await
            .unwrap();
        assert_eq!(store.blocked_lookups(), 0);
    }

    #[tokio::test]
    async fn failure_leaves_listing_untouched() {
        let store = store().failing();
        let snapshot = ConfigSnapshot::Enforced(rule());
        let mut listing = sample_listing();
        let result = FeaturedListFilter::new(&snapshot, &store)
            .apply(&mut listing, &Viewer::Anonymous)
            .await;
        assert!(result.is_err());
        assert_eq!(listing, sample_listing());
    }
}
