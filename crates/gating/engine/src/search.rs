use tracing::debug;

use tag_gating_types::{ConfigSnapshot, SearchResults, StoreError, TagStore, Viewer};

use crate::policy::AccessPolicy;
use crate::tag_index::TagIndex;

/// Excludes gated content from search results.
///
/// Uses the same blocked-set query as [`crate::CollectionFilter`], scoped to
/// the ids in the result set, so search and listings exclude the same ids.
pub struct SearchFilter<'a, S: TagStore + ?Sized> {
    snapshot: &'a ConfigSnapshot,
    store: &'a S,
}

impl<'a, S: TagStore + ?Sized> SearchFilter<'a, S> {
    pub fn new(snapshot: &'a ConfigSnapshot, store: &'a S) -> Self {
        Self { snapshot, store }
    }

    pub async fn apply(
        &self,
        mut results: SearchResults,
        viewer: &Viewer,
    ) -> Result<SearchResults, StoreError> {
        let rule = match self.snapshot.rule() {
            Some(rule) => rule,
            None => return Ok(results),
        };
        if results.hits.is_empty() || AccessPolicy::new(rule).evaluate(viewer) {
            return Ok(results);
        }

        let blocked = TagIndex::new(self.store, rule)
            .blocked_ids_among(viewer, results.content_ids())
            .await?;
        if blocked.is_empty() {
            return Ok(results);
        }

        let before = results.hits.len();
        results.hits.retain(|hit| !blocked.contains(&hit.content_id));
        debug!(
            term = %results.term,
            removed = before - results.hits.len(),
            "Gated content removed from search results"
        );
        Ok(results)
    }
}
