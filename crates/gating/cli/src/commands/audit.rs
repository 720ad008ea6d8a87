//! Cross-surface audit.
//!
//! Every topic in the fixture is evaluated on all five surfaces under a
//! single config snapshot. The surfaces must agree; any topic on which they
//! do not is reported and the command fails.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use tag_gating_engine::{CollectionFilter, ContentGuard, FeaturedListFilter, SearchFilter};
use tag_gating_types::{
    ContentId, ContentScope, FeaturedListing, GatingError, ScopeExecutor, SearchHit,
    SearchResults, Viewer,
};

use super::Target;
use crate::error::{CliError, CliResult};
use crate::output::print_json;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopicVerdict {
    pub topic: ContentId,
    pub can_see: bool,
    pub assert_visible: bool,
    pub collection: bool,
    pub search: bool,
    pub featured: bool,
}

impl TopicVerdict {
    pub fn agrees(&self) -> bool {
        [self.assert_visible, self.collection, self.search, self.featured]
            .iter()
            .all(|v| *v == self.can_see)
    }
}

#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub viewer: Viewer,
    pub revision: u64,
    pub enforced: bool,
    pub topics: Vec<TopicVerdict>,
    pub divergent: Vec<ContentId>,
}

pub async fn evaluate(target: &Target) -> CliResult<AuditReport> {
    let snap = target.gate.snapshot();
    let store = &*target.store;
    let viewer = &target.viewer;
    let topics = store.topics();

    let scope = CollectionFilter::new(&snap.snapshot).apply(ContentScope::topics(), viewer);
    let listed: HashSet<ContentId> = store
        .fetch(&scope)
        .await?
        .into_iter()
        .map(|row| row.content_id)
        .collect();

    let results = SearchResults::new(
        "audit",
        topics.iter().map(|t| SearchHit::topic(t.id)).collect(),
    );
    let searched = SearchFilter::new(&snap.snapshot, store)
        .apply(results, viewer)
        .await?
        .content_ids();

    let mut listing = FeaturedListing::from_topics(topics.clone());
    FeaturedListFilter::new(&snap.snapshot, store)
        .apply(&mut listing, viewer)
        .await?;
    let featured = listing.content_ids();

    let guard = ContentGuard::new(&snap.snapshot, store);
    let mut verdicts = Vec::with_capacity(topics.len());
    for topic in &topics {
        // Direct checks see the record the way a handler loads it.
        let record = store.topic(topic.id).ok_or(CliError::UnknownTopic(topic.id.0))?;
        let can_see = guard.can_see(viewer, &record, true).await?;
        let assert_visible = match guard.assert_visible(viewer, &record, true).await {
            Ok(()) => true,
            Err(GatingError::AccessDenied { .. }) => false,
            Err(err) => return Err(err.into()),
        };
        verdicts.push(TopicVerdict {
            topic: topic.id,
            can_see,
            assert_visible,
            collection: listed.contains(&topic.id),
            search: searched.contains(&topic.id),
            featured: featured.contains(&topic.id),
        });
    }

    let divergent: Vec<ContentId> = verdicts
        .iter()
        .filter(|v| !v.agrees())
        .map(|v| v.topic)
        .collect();
    for id in &divergent {
        warn!(topic = %id, viewer = %viewer, "Surfaces disagree");
    }
    if !listing.views_agree() {
        warn!(viewer = %viewer, "Featured per-category view lists topics missing from the flat view");
    }

    Ok(AuditReport {
        viewer: viewer.clone(),
        revision: snap.revision,
        enforced: snap.snapshot.is_enforced(),
        topics: verdicts,
        divergent,
    })
}

pub async fn execute(target: &Target) -> CliResult<()> {
    let report = evaluate(target).await?;
    info!(
        viewer = %report.viewer,
        topics = report.topics.len(),
        divergent = report.divergent.len(),
        "Audit complete"
    );
    print_json(&report)?;
    match report.divergent.len() {
        0 => Ok(()),
        n => Err(CliError::Divergence(n)),
    }
}
