//! Single-object visibility: the boolean check and the raising check.
//!
//! Both are answers to the same [`GuardDecision`], so a topic that
//! `can_see` hides is exactly a topic `assert_visible` rejects.

use tracing::debug;

use tag_gating_types::{
    ConfigSnapshot, Content, GatingError, GatingResult, StoreError, TagStore, Viewer,
};

use crate::policy::AccessPolicy;
use crate::tag_index::TagIndex;

/// Outcome of the single-object check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed,
    /// The host's base permission check already refused.
    BaseDenied,
    /// Gated content and the viewer is neither owner nor entitled.
    Gated,
}

pub struct ContentGuard<'a, S: TagStore + ?Sized> {
    snapshot: &'a ConfigSnapshot,
    store: &'a S,
}

impl<'a, S: TagStore + ?Sized> ContentGuard<'a, S> {
    pub fn new(snapshot: &'a ConfigSnapshot, store: &'a S) -> Self {
        Self { snapshot, store }
    }

    /// Decide visibility for one content item.
    ///
    /// Gating only narrows `base_allowed`; with gating disabled the base
    /// decision passes through untouched.
    pub async fn decide(
        &self,
        viewer: &Viewer,
        content: &Content,
        base_allowed: bool,
    ) -> Result<GuardDecision, StoreError> {
        if !base_allowed {
            return Ok(GuardDecision::BaseDenied);
        }
        let rule = match self.snapshot.rule() {
            Some(rule) => rule,
            None => return Ok(GuardDecision::Allowed),
        };

        if viewer.owns(content.owner) {
            return Ok(GuardDecision::Allowed);
        }
        // Entitlement is pure, so it goes before the tag lookup.
        if AccessPolicy::new(rule).evaluate(viewer) {
            return Ok(GuardDecision::Allowed);
        }
        if !TagIndex::new(self.store, rule).is_gated(content).await? {
            return Ok(GuardDecision::Allowed);
        }

        debug!(content_id = %content.id, viewer = %viewer, "Gated content denied");
        Ok(GuardDecision::Gated)
    }

    /// Boolean form, for callers deciding whether to show a link at all.
    pub async fn can_see(
        &self,
        viewer: &Viewer,
        content: &Content,
        base_allowed: bool,
    ) -> Result<bool, StoreError> {
        Ok(self.decide(viewer, content, base_allowed).await? == GuardDecision::Allowed)
    }

    /// Raising form, for direct access paths.
    ///
    /// `AccessDenied` carries the fixed gating reason; the presentation
    /// layer turns it into the one "access required" response.
    pub async fn assert_visible(
        &self,
        viewer: &Viewer,
        content: &Content,
        base_allowed: bool,
    ) -> GatingResult<()> {
        match self.decide(viewer, content, base_allowed).await? {
            GuardDecision::Allowed => Ok(()),
            GuardDecision::BaseDenied => Err(GatingError::NotFound(content.id)),
            GuardDecision::Gated => Err(GatingError::gated(content.id)),
        }
    }
}
