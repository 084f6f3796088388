//! Error types shared across the detection engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the coordinator and its detectors.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DetectionError {
    #[error("graph has not been built for this coordinator")]
    GraphNotBuilt,

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("unknown configuration parameter: {0}")]
    UnknownParameter(String),

    #[error("cycle enumeration budget exceeded")]
    CycleEnumerationAborted,
}
