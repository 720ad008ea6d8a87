//! In-process store for tests, fixtures and the CLI.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use tag_gating_types::{
    BlockedSetQuery, CategoryId, Content, ContentId, ContentScope, Identity, Relation,
    ScopeExecutor, ScopeRow, StoreError, TagStore, Viewer, ViewerId, ViewerResolver,
};

use crate::fixture::{Fixture, PostRecord, TopicRecord};

/// Topics, posts, tags and users held in memory.
///
/// Every trait call counts as one round trip, so callers can assert how
/// many queries an operation cost.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<ViewerId, Identity>>,
    topics: RwLock<BTreeMap<ContentId, TopicRecord>>,
    posts: RwLock<BTreeMap<i64, PostRecord>>,
    round_trips: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let store = Self::new();
        {
            let mut users = write(&store.users);
            for user in fixture.users {
                users.insert(user.id, user);
            }
        }
        {
            let mut topics = write(&store.topics);
            for topic in fixture.topics {
                topics.insert(topic.id, topic);
            }
        }
        {
            let mut posts = write(&store.posts);
            for post in fixture.posts {
                posts.insert(post.id, post);
            }
        }
        store
    }

    pub fn insert_user(&self, identity: Identity) {
        write(&self.users).insert(identity.id, identity);
    }

    pub fn insert_topic(&self, topic: TopicRecord) {
        write(&self.topics).insert(topic.id, topic);
    }

    pub fn insert_post(&self, id: i64, topic_id: ContentId) {
        write(&self.posts).insert(id, PostRecord { id, topic_id });
    }

    /// Replace a topic's tags, as a moderator retagging it would.
    pub fn set_tags(&self, topic_id: ContentId, tags: Vec<String>) -> bool {
        match write(&self.topics).get_mut(&topic_id) {
            Some(topic) => {
                topic.tags = tags;
                true
            }
            None => false,
        }
    }

    /// One topic with tags not loaded, as a plain lookup returns it.
    pub fn topic(&self, id: ContentId) -> Option<Content> {
        read(&self.topics).get(&id).map(|t| {
            let mut content = Content::new(t.id, t.owner);
            content.category = t.category;
            content
        })
    }

    /// All topics in id order, tags preloaded.
    pub fn topics(&self) -> Vec<Content> {
        read(&self.topics).values().map(TopicRecord::to_content).collect()
    }

    pub fn user_ids(&self) -> Vec<ViewerId> {
        let mut ids: Vec<ViewerId> = read(&self.users).keys().copied().collect();
        ids.sort();
        ids
    }

    /// Round trips served since creation or the last reset.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn reset_round_trips(&self) {
        self.round_trips.store(0, Ordering::SeqCst);
    }

    fn count(&self) {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
    }

    fn blocked_among(
        topics: &BTreeMap<ContentId, TopicRecord>,
        query: &BlockedSetQuery,
    ) -> HashSet<ContentId> {
        topics
            .values()
            .filter(|t| query.blocks(t.id, t.owner, t.tags.as_slice()))
            .map(|t| t.id)
            .collect()
    }
}

// The maps are only ever replaced entry by entry, so a poisoned guard still
// holds consistent data.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl TagStore for InMemoryStore {
    async fn tags_for(&self, content_id: ContentId) -> Result<Vec<String>, StoreError> {
        self.count();
        Ok(read(&self.topics)
            .get(&content_id)
            .map(|t| t.tags.clone())
            .unwrap_or_default())
    }

    async fn resolve_blocked(
        &self,
        query: &BlockedSetQuery,
    ) -> Result<HashSet<ContentId>, StoreError> {
        self.count();
        let blocked = Self::blocked_among(&read(&self.topics), query);
        debug!(tag = %query.tag_name, blocked = blocked.len(), "Blocked set resolved");
        Ok(blocked)
    }
}

#[async_trait]
impl ScopeExecutor for InMemoryStore {
    async fn fetch(&self, scope: &ContentScope) -> Result<Vec<ScopeRow>, StoreError> {
        self.count();
        let topics = read(&self.topics);

        // Sub-queries are resolved inside the same round trip.
        let excluded: HashSet<ContentId> = scope
            .excluded
            .iter()
            .flat_map(|q| Self::blocked_among(&topics, q))
            .collect();

        let category_of = |id: &ContentId| -> Option<CategoryId> {
            topics.get(id).and_then(|t| t.category)
        };

        let rows: Vec<ScopeRow> = match scope.relation {
            Relation::Topics => topics
                .keys()
                .map(|id| ScopeRow {
                    row_id: id.0,
                    content_id: *id,
                })
                .collect(),
            Relation::Posts => read(&self.posts)
                .values()
                .map(|p| ScopeRow {
                    row_id: p.id,
                    content_id: p.topic_id,
                })
                .collect(),
        };

        let filtered = rows
            .into_iter()
            .filter(|row| match scope.category {
                Some(category) => category_of(&row.content_id) == Some(category),
                None => true,
            })
            .filter(|row| !excluded.contains(&row.content_id));

        Ok(match scope.page {
            Some(page) => filtered.skip(page.offset).take(page.limit).collect(),
            None => filtered.collect(),
        })
    }
}

#[async_trait]
impl ViewerResolver for InMemoryStore {
    async fn resolve(&self, actor: Option<ViewerId>) -> Result<Viewer, StoreError> {
        let id = match actor {
            Some(id) => id,
            None => return Ok(Viewer::Anonymous),
        };
        self.count();
        match read(&self.users).get(&id) {
            Some(identity) => Ok(Viewer::User(identity.clone())),
            None => {
                debug!(viewer = %id, "Unknown viewer treated as anonymous");
                Ok(Viewer::Anonymous)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryStore {
        let store = InMemoryStore::from_fixture(Fixture {
            users: vec![Identity::new(ViewerId(1)).with_attribute("7", "false")],
            topics: vec![
                TopicRecord {
                    id: ContentId(10),
                    owner: Some(ViewerId(1)),
                    category: Some(CategoryId(1)),
                    tags: vec!["restricted".into()],
                },
                TopicRecord {
                    id: ContentId(20),
                    owner: Some(ViewerId(2)),
                    category: Some(CategoryId(1)),
                    tags: vec!["restricted".into()],
                },
                TopicRecord {
                    id: ContentId(30),
                    owner: Some(ViewerId(2)),
                    category: Some(CategoryId(2)),
                    tags: vec![],
                },
            ],
            posts: vec![],
        });
        for (post, topic) in [(1, 10), (2, 20), (3, 20), (4, 30)] {
            store.insert_post(post, ContentId(topic));
        }
        store
    }

    fn content_ids(rows: &[ScopeRow]) -> Vec<i64> {
        rows.iter().map(|r| r.content_id.0).collect()
    }

    #[tokio::test]
    async fn resolves_blocked_with_owner_exemption() {
        let store = store();
        let query = BlockedSetQuery::tagged("restricted").exempting(Some(ViewerId(1)));
        let blocked = store.resolve_blocked(&query).await.unwrap();
        assert_eq!(blocked, [ContentId(20)].into_iter().collect());
    }

    #[tokio::test]
    async fn scope_exclusion_runs_in_one_round_trip() {
        let store = store();
        let scope = ContentScope::posts().exclude_blocked(BlockedSetQuery::tagged("restricted"));
        let rows = store.fetch(&scope).await.unwrap();
        assert_eq!(content_ids(&rows), vec![30]);
        assert_eq!(rows[0].row_id, 4);
        assert_eq!(store.round_trips(), 1);
    }

    #[tokio::test]
    async fn exclusion_applies_before_pagination() {
        let store = store();
        let scope = ContentScope::topics()
            .exclude_blocked(BlockedSetQuery::tagged("restricted"))
            .paginate(0, 1);
        let rows = store.fetch(&scope).await.unwrap();
        assert_eq!(content_ids(&rows), vec![30]);
    }

    #[tokio::test]
    async fn category_and_pagination() {
        let store = store();
        let scope = ContentScope::posts().in_category(CategoryId(1)).paginate(1, 2);
        let rows = store.fetch(&scope).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.row_id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn retagging_is_seen_immediately() {
        let store = store();
        let query = BlockedSetQuery::tagged("restricted");
        assert_eq!(store.resolve_blocked(&query).await.unwrap().len(), 2);
        assert!(store.set_tags(ContentId(30), vec!["restricted".into()]));
        assert_eq!(store.resolve_blocked(&query).await.unwrap().len(), 3);
        assert!(!store.set_tags(ContentId(99), vec![]));
    }

    #[tokio::test]
    async fn resolves_viewers() {
        let store = store();
        assert_eq!(store.resolve(None).await.unwrap(), Viewer::Anonymous);
        assert_eq!(store.resolve(Some(ViewerId(99))).await.unwrap(), Viewer::Anonymous);
        let viewer = store.resolve(Some(ViewerId(1))).await.unwrap();
        assert_eq!(viewer.attribute("7"), Some("false"));
    }

    #[tokio::test]
    async fn tags_for_unknown_topic_is_empty() {
        let store = store();
        assert!(store.tags_for(ContentId(404)).await.unwrap().is_empty());
        assert_eq!(store.tags_for(ContentId(10)).await.unwrap(), vec!["restricted"]);
    }

    #[test]
    fn plain_topic_lookup_does_not_preload_tags() {
        let store = store();
        let topic = store.topic(ContentId(10)).unwrap();
        assert!(topic.tags.as_loaded().is_none());
        assert_eq!(topic.category, Some(CategoryId(1)));
        assert!(store.topics().iter().all(|t| t.tags.as_loaded().is_some()));
    }
}
