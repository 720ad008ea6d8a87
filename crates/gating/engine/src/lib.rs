//! # tag-gating-engine
//!
//! One content-visibility rule, enforced the same way on every surface
//! that can show content:
//!
//! - **ContentGuard**: single topic, as a boolean (`can_see`) or raising
//!   (`assert_visible`) check
//! - **CollectionFilter**: composable post/topic scopes
//! - **SearchFilter**: search result sets
//! - **FeaturedListFilter**: in-memory featured listings in their flat and
//!   per-category views
//!
//! The rule: content carrying the gating tag is hidden unless the viewer
//! owns it, is privileged, or carries the required attribute value. Every
//! surface asks [`AccessPolicy`] for entitlement and derives its exclusions
//! from [`TagIndex`]'s one blocked-set query.
//!
//! Configuration is read once per invocation from [`GatingConfigStore`];
//! unusable configuration disables enforcement on every surface at once.

#![deny(unsafe_code)]

pub mod collection;
pub mod config;
pub mod featured;
pub mod gate;
pub mod guard;
pub mod http;
pub mod policy;
pub mod search;
pub mod tag_index;

#[cfg(test)]
mod testing;

pub use collection::CollectionFilter;
pub use config::{GatingConfigStore, ResolvedConfig, VersionedSnapshot};
pub use featured::FeaturedListFilter;
pub use gate::TagGate;
pub use guard::{ContentGuard, GuardDecision};
pub use http::{render, ErrorBody, Rejection};
pub use policy::AccessPolicy;
pub use search::SearchFilter;
pub use tag_index::{blocked_query, TagIndex};
