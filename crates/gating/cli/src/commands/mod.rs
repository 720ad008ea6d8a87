//! Subcommand implementations.

pub mod audit;
pub mod surfaces;

use std::path::Path;
use std::sync::Arc;

use tag_gating_engine::{GatingConfigStore, TagGate};
use tag_gating_store::{Fixture, InMemoryStore};
use tag_gating_types::{Content, ContentId, Viewer, ViewerId, ViewerResolver};

use crate::error::{CliError, CliResult};

/// A loaded fixture, the gate in front of it, and the resolved viewer.
pub struct Target {
    pub gate: TagGate<InMemoryStore>,
    pub store: Arc<InMemoryStore>,
    pub viewer: Viewer,
}

impl Target {
    pub async fn new(
        config: Arc<GatingConfigStore>,
        store: Arc<InMemoryStore>,
        viewer: Option<i64>,
    ) -> CliResult<Self> {
        let viewer = store.resolve(viewer.map(ViewerId)).await?;
        Ok(Self {
            gate: TagGate::new(config, Arc::clone(&store)),
            store,
            viewer,
        })
    }

    /// Seed an in-memory store from a fixture file.
    pub async fn load(
        config: Arc<GatingConfigStore>,
        fixture: &Path,
        viewer: Option<i64>,
    ) -> CliResult<Self> {
        let store = Arc::new(InMemoryStore::from_fixture(Fixture::load(fixture)?));
        Self::new(config, store, viewer).await
    }

    /// The topic as a request handler would see it, with tags not loaded.
    pub fn topic(&self, id: i64) -> CliResult<Content> {
        self.store
            .topic(ContentId(id))
            .ok_or(CliError::UnknownTopic(id))
    }
}
