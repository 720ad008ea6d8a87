use tracing::trace;

use tag_gating_types::{GatingRule, Viewer};

/// Entitlement decision for gated content.
///
/// Pure function of the viewer and the rule: no I/O, never fails. A missing
/// attribute means "not entitled", not an error.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy<'a> {
    rule: &'a GatingRule,
}

impl<'a> AccessPolicy<'a> {
    pub fn new(rule: &'a GatingRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &'a GatingRule {
        self.rule
    }

    /// Whether `viewer` may see gated content it does not own.
    pub fn evaluate(&self, viewer: &Viewer) -> bool {
        let identity = match viewer {
            Viewer::Anonymous => return false,
            Viewer::User(identity) => identity,
        };
        if identity.privileged {
            return true;
        }

        let entitled = identity
            .attributes
            .get(&self.rule.attribute_id)
            .is_some_and(|value| value == self.rule.required_value_str());

        trace!(
            viewer = %identity.id,
            attribute_id = %self.rule.attribute_id,
            entitled,
            "Entitlement evaluated"
        );
        entitled
    }
}
