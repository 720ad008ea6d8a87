//! Lazily-executed query shapes.
//!
//! A [`ContentScope`] is a description of rows to fetch, not the rows
//! themselves. Filters compose by returning a new scope; the store executes
//! it in one round trip. The blocked set travels inside the scope as a
//! [`BlockedSetQuery`] sub-query instead of a materialized id list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ids::{CategoryId, ContentId, ViewerId};

/// Content that carries the gating tag, minus what the viewer owns.
///
/// Every surface derives its exclusions from this one value, and every store
/// evaluates it through [`BlockedSetQuery::blocks`] (or its SQL rendering),
/// so listings, search and featured lists cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockedSetQuery {
    pub tag_name: String,
    /// Content owned by this viewer is never blocked.
    pub exempt_owner: Option<ViewerId>,
    /// Restrict the lookup to these ids (in-view content only).
    pub within: Option<BTreeSet<ContentId>>,
}

impl BlockedSetQuery {
    /// Every content id carrying `tag_name`.
    pub fn tagged(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            exempt_owner: None,
            within: None,
        }
    }

    pub fn exempting(mut self, owner: Option<ViewerId>) -> Self {
        self.exempt_owner = owner;
        self
    }

    pub fn within<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = ContentId>,
    {
        self.within = Some(ids.into_iter().collect());
        self
    }

    /// Whether a content row falls in the blocked set.
    pub fn blocks<S: AsRef<str>>(&self, id: ContentId, owner: Option<ViewerId>, tags: &[S]) -> bool {
        if let Some(within) = &self.within {
            if !within.contains(&id) {
                return false;
            }
        }
        if self.exempt_owner.is_some() && owner == self.exempt_owner {
            return false;
        }
        tags.iter().any(|t| t.as_ref() == self.tag_name)
    }
}

/// Which table a scope reads and how rows reference content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Posts, referencing content through `topic_id`.
    Posts,
    /// Topics, which are the content rows themselves.
    Topics,
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

/// A composable, not-yet-executed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentScope {
    pub relation: Relation,
    pub category: Option<CategoryId>,
    /// Rows whose content falls in any of these sets are excluded.
    pub excluded: Vec<BlockedSetQuery>,
    /// Applied after exclusions.
    pub page: Option<Page>,
}

impl ContentScope {
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            category: None,
            excluded: Vec::new(),
            page: None,
        }
    }

    pub fn posts() -> Self {
        Self::new(Relation::Posts)
    }

    pub fn topics() -> Self {
        Self::new(Relation::Topics)
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn paginate(mut self, offset: usize, limit: usize) -> Self {
        self.page = Some(Page { offset, limit });
        self
    }

    /// Add an exclusion. Adding the same exclusion twice is a no-op.
    pub fn exclude_blocked(mut self, query: BlockedSetQuery) -> Self {
        if !self.excluded.contains(&query) {
            self.excluded.push(query);
        }
        self
    }
}

/// One row produced by executing a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeRow {
    /// Post id or topic id, depending on the relation.
    pub row_id: i64,
    pub content_id: ContentId,
}
