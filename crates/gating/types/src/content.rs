//! Gateable content and its tag association.

use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, ContentId, ViewerId};

/// Tags attached to a content item, if the caller already has them.
///
/// `NotLoaded` is an explicit state: the engine must fetch rather than
/// assume "no tags".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "names", rename_all = "snake_case")]
pub enum TagAssociation {
    Loaded(Vec<String>),
    #[default]
    NotLoaded,
}

impl TagAssociation {
    pub fn loaded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagAssociation::Loaded(names.into_iter().map(Into::into).collect())
    }

    pub fn as_loaded(&self) -> Option<&[String]> {
        match self {
            TagAssociation::Loaded(names) => Some(names),
            TagAssociation::NotLoaded => None,
        }
    }
}

/// A content item as seen by the enforcement surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    /// `None` when the owning account no longer exists.
    pub owner: Option<ViewerId>,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub tags: TagAssociation,
}

impl Content {
    pub fn new(id: ContentId, owner: Option<ViewerId>) -> Self {
        Self {
            id,
            owner,
            category: None,
            tags: TagAssociation::NotLoaded,
        }
    }

    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = TagAssociation::loaded(names);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_default_to_not_loaded() {
        let content = Content::new(ContentId(1), Some(ViewerId(2)));
        assert_eq!(content.tags, TagAssociation::NotLoaded);
        assert!(content.tags.as_loaded().is_none());
    }

    #[test]
    fn loaded_empty_is_distinct_from_not_loaded() {
        let content = Content::new(ContentId(1), None).with_tags(Vec::<String>::new());
        assert_eq!(content.tags.as_loaded(), Some(&[][..]));
    }
}
