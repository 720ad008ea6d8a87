//! JSON fixtures for seeding an [`crate::InMemoryStore`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use tag_gating_types::{CategoryId, Content, ContentId, Identity, StoreError, TagAssociation, ViewerId};

/// A topic row with its tag association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: ContentId,
    #[serde(default)]
    pub owner: Option<ViewerId>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TopicRecord {
    /// As content with its tags already loaded.
    pub fn to_content(&self) -> Content {
        Content {
            id: self.id,
            owner: self.owner,
            category: self.category,
            tags: TagAssociation::Loaded(self.tags.clone()),
        }
    }
}

/// A post row, referencing its topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub topic_id: ContentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Fixture {
    #[serde(default)]
    pub users: Vec<Identity>,
    #[serde(default)]
    pub topics: Vec<TopicRecord>,
    #[serde(default)]
    pub posts: Vec<PostRecord>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::InvalidData(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_fixture() {
        let fixture = Fixture::from_json(
            r#"{
                "users": [{ "id": 1, "attributes": { "7": "true" } }],
                "topics": [{ "id": 10, "owner": 1, "category": 2, "tags": ["restricted"] }],
                "posts": [{ "id": 100, "topic_id": 10 }]
            }"#,
        )
        .unwrap();
        assert_eq!(fixture.users[0].attributes["7"], "true");
        assert!(!fixture.users[0].privileged);
        assert_eq!(fixture.topics[0].category, Some(CategoryId(2)));
        assert_eq!(fixture.posts[0].topic_id, ContentId(10));
    }

    #[test]
    fn missing_sections_default_empty() {
        let fixture = Fixture::from_json("{}").unwrap();
        assert_eq!(fixture, Fixture::default());
    }

    #[test]
    fn bad_json_is_invalid_data() {
        assert!(matches!(
            Fixture::from_json("{"),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"topics": [{ "id": 3 }]}"#).unwrap();
        let fixture = Fixture::load(file.path()).unwrap();
        assert_eq!(fixture.topics[0].id, ContentId(3));
        assert!(fixture.topics[0].tags.is_empty());
        assert!(matches!(
            Fixture::load("/nonexistent/fixture.json"),
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn topic_record_preloads_tags() {
        let record = TopicRecord {
            id: ContentId(1),
            owner: None,
            category: None,
            tags: vec!["a".into()],
        };
        assert_eq!(record.to_content().tags.as_loaded(), Some(&["a".to_string()][..]));
    }
}
