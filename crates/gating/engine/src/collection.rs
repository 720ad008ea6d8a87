use tracing::debug;

use tag_gating_types::{ConfigSnapshot, ContentScope, Viewer};

use crate::policy::AccessPolicy;
use crate::tag_index::blocked_query;

/// Excludes gated content from a composable scope (post and topic lists).
///
/// The blocked set is embedded as a sub-query, so no store round trip
/// happens here and the executed scope costs one query however many rows
/// it returns.
#[derive(Debug, Clone, Copy)]
pub struct CollectionFilter<'a> {
    snapshot: &'a ConfigSnapshot,
}

impl<'a> CollectionFilter<'a> {
    pub fn new(snapshot: &'a ConfigSnapshot) -> Self {
        Self { snapshot }
    }

    /// Returns a new scope; applying it twice equals applying it once.
    pub fn apply(&self, scope: ContentScope, viewer: &Viewer) -> ContentScope {
        let rule = match self.snapshot.rule() {
            Some(rule) => rule,
            None => return scope,
        };
        if AccessPolicy::new(rule).evaluate(viewer) {
            return scope;
        }

        debug!(
            relation = ?scope.relation,
            viewer = %viewer,
            tag = %rule.tag_name,
            "Excluding gated content from scope"
        );
        scope.exclude_blocked(blocked_query(rule, viewer))
    }
}
