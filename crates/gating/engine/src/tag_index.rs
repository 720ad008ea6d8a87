//! Resolution of the gating tag to content ids.
//!
//! Nothing here is cached. Each call goes to the store, because a blocked
//! set computed for one viewer or one request is wrong for the next.

use std::collections::HashSet;
use tracing::debug;

use tag_gating_types::{BlockedSetQuery, Content, ContentId, GatingRule, StoreError, TagStore, Viewer};

/// The blocked-set query for `viewer` under `rule`, unexecuted.
///
/// Anonymous viewers own nothing, so nothing gated is exempt.
pub fn blocked_query(rule: &GatingRule, viewer: &Viewer) -> BlockedSetQuery {
    BlockedSetQuery::tagged(rule.tag_name.as_str()).exempting(viewer.id())
}

pub struct TagIndex<'a, S: TagStore + ?Sized> {
    store: &'a S,
    rule: &'a GatingRule,
}

impl<'a, S: TagStore + ?Sized> TagIndex<'a, S> {
    pub fn new(store: &'a S, rule: &'a GatingRule) -> Self {
        Self { store, rule }
    }

    pub fn blocked_query(&self, viewer: &Viewer) -> BlockedSetQuery {
        blocked_query(self.rule, viewer)
    }

    /// Every content id currently carrying the gating tag.
    pub async fn gated_content_ids(&self) -> Result<HashSet<ContentId>, StoreError> {
        self.store
            .resolve_blocked(&BlockedSetQuery::tagged(self.rule.tag_name.as_str()))
            .await
    }

    /// Whether one item carries the gating tag.
    ///
    /// Uses `known_tags` when the caller already loaded them; otherwise the
    /// tags are fetched. There is no third path.
    pub async fn is_content_gated(
        &self,
        content_id: ContentId,
        known_tags: Option<&[String]>,
    ) -> Result<bool, StoreError> {
        let gated = match known_tags {
            Some(tags) => self.carries_tag(tags),
            None => {
                let fetched = self.store.tags_for(content_id).await?;
                self.carries_tag(&fetched)
            }
        };
        debug!(
            content_id = %content_id,
            preloaded = known_tags.is_some(),
            gated,
            "Gating tag checked"
        );
        Ok(gated)
    }

    pub async fn is_gated(&self, content: &Content) -> Result<bool, StoreError> {
        self.is_content_gated(content.id, content.tags.as_loaded())
            .await
    }

    /// Gated content not owned by `viewer`.
    pub async fn blocked_ids_for(&self, viewer: &Viewer) -> Result<HashSet<ContentId>, StoreError> {
        self.store.resolve_blocked(&self.blocked_query(viewer)).await
    }

    /// [`Self::blocked_ids_for`] restricted to `in_view`, for surfaces that
    /// already hold a handful of ids.
    pub async fn blocked_ids_among<I>(
        &self,
        viewer: &Viewer,
        in_view: I,
    ) -> Result<HashSet<ContentId>, StoreError>
    where
        I: IntoIterator<Item = ContentId>,
    {
        let query = self.blocked_query(viewer).within(in_view);
        self.store.resolve_blocked(&query).await
    }

    fn carries_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| *t == self.rule.tag_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rule, MockTagStore};
    use tag_gating_types::{Identity, ViewerId};

    fn store() -> MockTagStore {
        MockTagStore::new()
            .topic(1, Some(10), &["restricted"])
            .topic(2, Some(20), &["restricted", "art"])
            .topic(3, Some(10), &["general"])
            .topic(4, None, &["restricted"])
    }

    #[tokio::test]
    async fn gated_ids_ignore_ownership() {
        let store = store();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        let ids = index.gated_content_ids().await.unwrap();
        assert_eq!(ids, [1, 2, 4].into_iter().map(ContentId).collect());
    }

    #[tokio::test]
    async fn blocked_excludes_owned_content() {
        let store = store();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        let viewer = Viewer::user(Identity::new(ViewerId(10)));
        let ids = index.blocked_ids_for(&viewer).await.unwrap();
        assert_eq!(ids, [2, 4].into_iter().map(ContentId).collect());
    }

    #[tokio::test]
    async fn anonymous_blocked_is_everything_gated() {
        let store = store();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        let ids = index.blocked_ids_for(&Viewer::Anonymous).await.unwrap();
        assert_eq!(ids, index.gated_content_ids().await.unwrap());
    }

    #[tokio::test]
    async fn blocked_among_scopes_lookup() {
        let store = store();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        let ids = index
            .blocked_ids_among(&Viewer::Anonymous, [ContentId(2), ContentId(3)])
            .await
            .unwrap();
        assert_eq!(ids, [ContentId(2)].into_iter().collect());
    }

    #[tokio::test]
    async fn preloaded_tags_skip_the_store() {
        let store = store();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        let tags = vec!["restricted".to_string()];
        // id 3 is not restricted in the store; the caller's tags win
        assert!(index.is_content_gated(ContentId(3), Some(tags.as_slice())).await.unwrap());
        assert_eq!(store.tag_lookups(), 0);
    }

    #[tokio::test]
    async fn missing_tags_are_fetched() {
        let store = store();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        assert!(index.is_content_gated(ContentId(2), None).await.unwrap());
        assert!(!index.is_content_gated(ContentId(3), None).await.unwrap());
        assert_eq!(store.tag_lookups(), 2);
    }

    #[tokio::test]
    async fn preloaded_empty_tags_are_trusted() {
        let store = store();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        let content = Content::new(ContentId(1), None).with_tags(Vec::<String>::new());
        assert!(!index.is_gated(&content).await.unwrap());
        assert_eq!(store.tag_lookups(), 0);
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let store = store().failing();
        let rule = rule();
        let index = TagIndex::new(&store, &rule);
        assert!(index.is_content_gated(ContentId(1), None).await.is_err());
        assert!(index.blocked_ids_for(&Viewer::Anonymous).await.is_err());
    }
}
