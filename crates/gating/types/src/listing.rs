//! Already-materialized result shapes: search hits and featured listings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::content::Content;
use crate::ids::{CategoryId, ContentId};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content_id: ContentId,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub blurb: Option<String>,
}

impl SearchHit {
    pub fn topic(content_id: ContentId) -> Self {
        Self {
            content_id,
            post_id: None,
            blurb: None,
        }
    }
}

/// Result set handed over by the search pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SearchResults {
    pub term: String,
    pub hits: Vec<SearchHit>,
}

impl SearchResults {
    pub fn new(term: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        Self {
            term: term.into(),
            hits,
        }
    }

    /// Distinct content ids referenced by the hits.
    pub fn content_ids(&self) -> HashSet<ContentId> {
        self.hits.iter().map(|h| h.content_id).collect()
    }
}

/// A featured listing held in two synchronized views.
///
/// `topics` is the flat ordered list; `category_topic_ids` references the
/// same items grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FeaturedListing {
    pub topics: Vec<Content>,
    pub category_topic_ids: BTreeMap<CategoryId, Vec<ContentId>>,
}

impl FeaturedListing {
    /// Build both views from a flat list, grouping by each item's category.
    pub fn from_topics(topics: Vec<Content>) -> Self {
        let mut category_topic_ids: BTreeMap<CategoryId, Vec<ContentId>> = BTreeMap::new();
        for topic in &topics {
            if let Some(category) = topic.category {
                category_topic_ids.entry(category).or_default().push(topic.id);
            }
        }
        Self {
            topics,
            category_topic_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && self.category_topic_ids.values().all(Vec::is_empty)
    }

    /// Every id referenced from either view.
    pub fn content_ids(&self) -> HashSet<ContentId> {
        self.topics
            .iter()
            .map(|t| t.id)
            .chain(self.category_topic_ids.values().flatten().copied())
            .collect()
    }

    /// Every id in a category view is also in the flat view.
    pub fn views_agree(&self) -> bool {
        let flat: HashSet<ContentId> = self.topics.iter().map(|t| t.id).collect();
        self.category_topic_ids
            .values()
            .flatten()
            .all(|id| flat.contains(id))
    }
}
