use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::StoreError;
use crate::ids::{ContentId, ViewerId};
use crate::query::{BlockedSetQuery, ContentScope, ScopeRow};
use crate::viewer::Viewer;

/// Tag-association store.
///
/// Implementations must not cache results across calls: tag membership
/// changes with moderation and a blocked set is only valid for the call
/// that produced it.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Tag names attached to one content item.
    async fn tags_for(&self, content_id: ContentId) -> Result<Vec<String>, StoreError>;

    /// Resolve a blocked-set query in a single round trip.
    async fn resolve_blocked(
        &self,
        query: &BlockedSetQuery,
    ) -> Result<HashSet<ContentId>, StoreError>;
}

/// Executes composed scopes.
#[async_trait]
pub trait ScopeExecutor: Send + Sync {
    async fn fetch(&self, scope: &ContentScope) -> Result<Vec<ScopeRow>, StoreError>;
}

/// Turns the current actor into a concrete [`Viewer`].
#[async_trait]
pub trait ViewerResolver: Send + Sync {
    /// `None` and unknown ids resolve to [`Viewer::Anonymous`].
    async fn resolve(&self, actor: Option<ViewerId>) -> Result<Viewer, StoreError>;
}
