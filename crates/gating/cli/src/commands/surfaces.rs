//! One command per surface. Every command prints JSON on stdout.

use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use tag_gating_engine::GatingConfigStore;
use tag_gating_types::{
    CategoryId, ConfigSnapshot, ContentId, ContentScope, FeaturedListing, GatingError,
    GatingSettings, ScopeExecutor, ScopeRow, SearchHit, SearchResults, Viewer,
};

use super::Target;
use crate::error::CliResult;
use crate::output::print_json;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RelationArg {
    Posts,
    Topics,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    source: Option<String>,
    revision: u64,
    settings: GatingSettings,
    snapshot: ConfigSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid: Option<String>,
}

fn config_report(config: &GatingConfigStore) -> ConfigReport {
    let current = config.current();
    ConfigReport {
        source: config.source().map(|p| p.display().to_string()),
        revision: current.revision,
        settings: (*current.settings).clone(),
        snapshot: current.snapshot.clone(),
        invalid: current.error.as_ref().map(|e| e.to_string()),
    }
}

pub fn show_config(config: &GatingConfigStore) -> CliResult<()> {
    print_json(&config_report(config))
}

#[derive(Serialize)]
struct CheckReport<'a> {
    viewer: &'a Viewer,
    topic: ContentId,
    visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<tag_gating_engine::ErrorBody>,
}

pub async fn check(target: &Target, topic: i64) -> CliResult<()> {
    let content = target.topic(topic)?;
    // The fixture grants base access to everything it contains.
    let (visible, error) = match target.gate.assert_visible(&target.viewer, &content, true).await {
        Ok(()) => (true, None),
        Err(err @ GatingError::AccessDenied { .. }) => {
            let (_, body) = tag_gating_engine::render(&err);
            (false, Some(body))
        }
        Err(err) => return Err(err.into()),
    };
    info!(viewer = %target.viewer, topic, visible, "Access checked");
    print_json(&CheckReport {
        viewer: &target.viewer,
        topic: content.id,
        visible,
        error,
    })
}

#[derive(Serialize)]
struct ListReport<'a> {
    viewer: &'a Viewer,
    scope: ContentScope,
    rows: Vec<ScopeRow>,
}

pub async fn list(
    target: &Target,
    relation: RelationArg,
    category: Option<i64>,
    offset: usize,
    limit: Option<usize>,
) -> CliResult<()> {
    let mut scope = match relation {
        RelationArg::Posts => ContentScope::posts(),
        RelationArg::Topics => ContentScope::topics(),
    };
    if let Some(category) = category {
        scope = scope.in_category(CategoryId(category));
    }
    if offset > 0 || limit.is_some() {
        scope = scope.paginate(offset, limit.unwrap_or(usize::MAX));
    }

    let scope = target.gate.filter_scope(scope, &target.viewer);
    let rows = target.store.fetch(&scope).await?;
    info!(viewer = %target.viewer, rows = rows.len(), "Listing fetched");
    print_json(&ListReport {
        viewer: &target.viewer,
        scope,
        rows,
    })
}

#[derive(Serialize)]
struct SearchReport<'a> {
    viewer: &'a Viewer,
    requested: usize,
    results: SearchResults,
}

pub async fn search(target: &Target, topics: &[i64]) -> CliResult<()> {
    let hits = topics
        .iter()
        .map(|id| SearchHit::topic(ContentId(*id)))
        .collect();
    let results = SearchResults::new("cli", hits);
    let requested = results.hits.len();
    let results = target.gate.filter_search(results, &target.viewer).await?;
    info!(viewer = %target.viewer, requested, kept = results.hits.len(), "Search filtered");
    print_json(&SearchReport {
        viewer: &target.viewer,
        requested,
        results,
    })
}

#[derive(Serialize)]
struct FeaturedReport<'a> {
    viewer: &'a Viewer,
    listing: FeaturedListing,
}

pub async fn featured(target: &Target) -> CliResult<()> {
    let mut listing = FeaturedListing::from_topics(target.store.topics());
    target.gate.filter_featured(&mut listing, &target.viewer).await?;
    print_json(&FeaturedReport {
        viewer: &target.viewer,
        listing,
    })
}
