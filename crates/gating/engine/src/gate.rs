use std::sync::Arc;
use tracing::trace;

use tag_gating_types::{
    Content, ContentScope, FeaturedListing, GatingResult, SearchResults, StoreError, TagStore,
    Viewer,
};

use crate::collection::CollectionFilter;
use crate::config::{GatingConfigStore, VersionedSnapshot};
use crate::featured::FeaturedListFilter;
use crate::guard::ContentGuard;
use crate::search::SearchFilter;

/// Call-site entry point for all five surfaces.
///
/// Each method takes exactly one config snapshot when it starts and hands
/// it to the adapter, then decorates the upstream value it was given: a
/// base permission decision, a scope, search results or a featured listing.
pub struct TagGate<S: TagStore + ?Sized> {
    config: Arc<GatingConfigStore>,
    store: Arc<S>,
}

impl<S: TagStore + ?Sized> Clone for TagGate<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TagStore + ?Sized> TagGate<S> {
    pub fn new(config: Arc<GatingConfigStore>, store: Arc<S>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &GatingConfigStore {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> VersionedSnapshot {
        let snap = self.config.snapshot();
        trace!(revision = snap.revision, enforced = snap.snapshot.is_enforced(), "Config snapshot taken");
        snap
    }

    pub async fn can_see(
        &self,
        viewer: &Viewer,
        content: &Content,
        base_allowed: bool,
    ) -> Result<bool, StoreError> {
        let snap = self.snapshot();
        ContentGuard::new(&snap.snapshot, &*self.store)
            .can_see(viewer, content, base_allowed)
            .await
    }

    pub async fn assert_visible(
        &self,
        viewer: &Viewer,
        content: &Content,
        base_allowed: bool,
    ) -> GatingResult<()> {
        let snap = self.snapshot();
        ContentGuard::new(&snap.snapshot, &*self.store)
            .assert_visible(viewer, content, base_allowed)
            .await
    }

    pub fn filter_scope(&self, scope: ContentScope, viewer: &Viewer) -> ContentScope {
        let snap = self.snapshot();
        CollectionFilter::new(&snap.snapshot).apply(scope, viewer)
    }

    pub async fn filter_search(
        &self,
        results: SearchResults,
        viewer: &Viewer,
    ) -> Result<SearchResults, StoreError> {
        let snap = self.snapshot();
        SearchFilter::new(&snap.snapshot, &*self.store)
            .apply(results, viewer)
            .await
    }

    pub async fn filter_featured(
        &self,
        listing: &mut FeaturedListing,
        viewer: &Viewer,
    ) -> Result<(), StoreError> {
        let snap = self.snapshot();
        FeaturedListFilter::new(&snap.snapshot, &*self.store)
            .apply(listing, viewer)
            .await
    }
}
