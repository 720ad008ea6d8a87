//! CLI error types

use tag_gating_types::{ConfigError, GatingError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Gating(#[from] GatingError),

    #[error("topic not found in fixture: {0}")]
    UnknownTopic(i64),

    #[error("surfaces disagree on {0} topic(s)")]
    Divergence(usize),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
