//! The actor a visibility decision is made for.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::ids::ViewerId;

/// The current actor, always a concrete value.
///
/// There is no "maybe a user" probing: resolvers hand the engine either an
/// [`Identity`] or `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewer {
    #[default]
    Anonymous,
    User(Identity),
}

/// Read-only snapshot of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: ViewerId,
    /// Staff-equivalent (admin or moderator).
    #[serde(default)]
    pub privileged: bool,
    /// Sparse attribute map keyed by attribute id.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Identity {
    pub fn new(id: ViewerId) -> Self {
        Self {
            id,
            privileged: false,
            attributes: HashMap::new(),
        }
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn with_attribute(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(id.into(), value.into());
        self
    }
}

impl Viewer {
    pub fn user(identity: Identity) -> Self {
        Viewer::User(identity)
    }

    pub fn id(&self) -> Option<ViewerId> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(identity) => Some(identity.id),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(identity) => Some(identity),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Viewer::Anonymous)
    }

    /// Anonymous viewers are never privileged.
    pub fn is_privileged(&self) -> bool {
        self.identity().map(|i| i.privileged).unwrap_or(false)
    }

    pub fn attribute(&self, id: &str) -> Option<&str> {
        self.identity()
            .and_then(|i| i.attributes.get(id))
            .map(String::as_str)
    }

    /// Whether this viewer owns content whose owner is `owner`.
    ///
    /// Anonymous viewers own nothing, and ownerless content has no owner.
    pub fn owns(&self, owner: Option<ViewerId>) -> bool {
        match (self.id(), owner) {
            (Some(me), Some(owner)) => me == owner,
            _ => false,
        }
    }
}

impl From<Identity> for Viewer {
    fn from(identity: Identity) -> Self {
        Viewer::User(identity)
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viewer::Anonymous => write!(f, "anonymous"),
            Viewer::User(identity) => write!(f, "{}", identity.id),
        }
    }
}
