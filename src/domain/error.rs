//! Errors raised by the template mutation engine.
//!
//! `RegionNotFound` and `InvalidTemplate` are fatal for one group only;
//! `UnsupportedTemplateFormat` stops the whole batch before any group runs.
//! Unparseable amounts are not errors at all, see [`CoercionWarning`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("region not found: no paragraph matching the {marker} marker")]
    RegionNotFound { marker: String },

    #[error("invalid template: {reason}")]
    InvalidTemplate { reason: String },

    #[error("unsupported template format '{}': {reason}", path.display())]
    UnsupportedTemplateFormat { path: PathBuf, reason: String },
}

/// An amount cell that could not be read as a number and was
/// treated as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionWarning {
    pub project: String,
    pub raw:     String,
}
