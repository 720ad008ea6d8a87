//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use tag_gating_types::{
    BlockedSetQuery, ContentId, GatingRule, GatingSettings, StoreError, TagStore, ViewerId,
};

pub fn rule() -> GatingRule {
    GatingSettings::enforced("restricted", "7", true)
        .validate()
        .expect("valid rule")
}

/// In-process tag store that counts round trips and can be told to fail.
#[derive(Default)]
pub struct MockTagStore {
    topics: HashMap<ContentId, (Option<ViewerId>, Vec<String>)>,
    fail: bool,
    tag_lookups: AtomicUsize,
    blocked_lookups: AtomicUsize,
}

impl MockTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(mut self, id: i64, owner: Option<i64>, tags: &[&str]) -> Self {
        self.topics.insert(
            ContentId(id),
            (
                owner.map(ViewerId),
                tags.iter().map(|t| t.to_string()).collect(),
            ),
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn tag_lookups(&self) -> usize {
        self.tag_lookups.load(Ordering::SeqCst)
    }

    pub fn blocked_lookups(&self) -> usize {
        self.blocked_lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Connection("mock store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TagStore for MockTagStore {
    async fn tags_for(&self, content_id: ContentId) -> Result<Vec<String>, StoreError> {
        self.tag_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .topics
            .get(&content_id)
            .map(|(_, tags)| tags.clone())
            .unwrap_or_default())
    }

    async fn resolve_blocked(
        &self,
        query: &BlockedSetQuery,
    ) -> Result<HashSet<ContentId>, StoreError> {
        self.blocked_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .topics
            .iter()
            .filter(|(id, (owner, tags))| query.blocks(**id, *owner, tags.as_slice()))
            .map(|(id, _)| *id)
            .collect())
    }
}
