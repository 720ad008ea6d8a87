//! # tag-gating-store
//!
//! Collaborator implementations for the gating engine:
//!
//! - [`InMemoryStore`]: topics, posts, tags and users held in process,
//!   loadable from a JSON [`Fixture`]; counts round trips for tests
//! - [`sql`]: PostgreSQL rendering of scopes and blocked-set sub-queries
//! - `postgres::PgStore` (feature `postgres`): sqlx-backed store over the
//!   forum schema

#![deny(unsafe_code)]

pub mod fixture;
pub mod memory;
pub mod sql;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use fixture::{Fixture, PostRecord, TopicRecord};
pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
