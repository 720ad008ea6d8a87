use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ids::ContentId;

/// Message code shown for every gating denial, whichever surface raised it.
pub const ACCESS_REQUIRED_MESSAGE: &str = "tag_gating.access_required";

/// Error type reported alongside [`ACCESS_REQUIRED_MESSAGE`].
pub const INVALID_ACCESS: &str = "invalid_access";

/// Why gating denied access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    GatedContent,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::GatedContent => "gated_content",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the enforcement surfaces.
#[derive(Error, Debug)]
pub enum GatingError {
    /// Final decision; not retryable.
    #[error("access denied to {content_id}: {reason}")]
    AccessDenied {
        reason: DenialReason,
        content_id: ContentId,
    },

    /// The host's own permission check already hid the content.
    #[error("content not found: {0}")]
    NotFound(ContentId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GatingError {
    pub fn gated(content_id: ContentId) -> Self {
        GatingError::AccessDenied {
            reason: DenialReason::GatedContent,
            content_id,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, GatingError::AccessDenied { .. })
    }
}

/// Failures from the content, tag or identity store. Always propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Local file backing an in-process store could not be read.
    #[error("i/o error: {0}")]
    Io(String),
}

/// Configuration that cannot be enforced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("gating is enabled but no tag name is configured")]
    MissingTagName,

    #[error("gating is enabled but no required attribute id is configured")]
    MissingAttributeId,

    #[error("malformed gating configuration: {0}")]
    Malformed(String),

    #[error("cannot read gating configuration: {0}")]
    Io(String),

    #[error("cannot parse gating configuration: {0}")]
    Parse(String),
}

pub type GatingResult<T> = Result<T, GatingError>;
