//! # tag-gating-types
//!
//! Shared vocabulary for the tag gating policy: who is looking
//! ([`Viewer`]), what they are looking at ([`Content`]), how the rule is
//! configured ([`GatingSettings`] / [`ConfigSnapshot`]) and the shapes each
//! enforcement surface works on ([`ContentScope`], [`SearchResults`],
//! [`FeaturedListing`]).
//!
//! The collaborator traits in [`traits`] are the only way the engine talks
//! to storage. Implementations live in `tag-gating-store`.

#![deny(unsafe_code)]

pub mod config;
pub mod content;
pub mod error;
pub mod ids;
pub mod listing;
pub mod query;
pub mod traits;
pub mod viewer;

pub use config::{ConfigSnapshot, GatingRule, GatingSettings};
pub use content::{Content, TagAssociation};
pub use error::{
    ConfigError, DenialReason, GatingError, GatingResult, StoreError, ACCESS_REQUIRED_MESSAGE,
    INVALID_ACCESS,
};
pub use ids::{CategoryId, ContentId, ViewerId};
pub use listing::{FeaturedListing, SearchHit, SearchResults};
pub use query::{BlockedSetQuery, ContentScope, Page, Relation, ScopeRow};
pub use traits::{ScopeExecutor, TagStore, ViewerResolver};
pub use viewer::{Identity, Viewer};
