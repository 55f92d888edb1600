//! Error types for the twin document

use std::fmt;

use thiserror::Error;

/// Errors that can occur while validating, merging or parsing a twin document.
///
/// Every variant is raised before any state is committed, so a failed call
/// always leaves the document exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TwinError {
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: KeyViolation },

    #[error("Invalid value for key {key:?}: {reason}")]
    InvalidValue { key: String, reason: ValueViolation },

    #[error("Malformed twin document: {0}")]
    StructuralShape(String),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(Feature),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
}

impl From<serde_json::Error> for TwinError {
    fn from(err: serde_json::Error) -> Self {
        TwinError::StructuralShape(err.to_string())
    }
}

/// Why a key was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyViolation {
    #[error("key is empty")]
    Empty,

    #[error("key is {length} characters long, max {max}")]
    TooLong { length: usize, max: usize },

    #[error("key contains illegal character {0:?}")]
    IllegalCharacter(char),
}

/// Why a value was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueViolation {
    #[error("unsupported value type: {0}")]
    UnsupportedType(&'static str),

    #[error("object nesting exceeds {max} levels")]
    DepthExceeded { max: usize },
}

/// Opt-in document features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Tags,
    Metadata,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Tags => write!(f, "tags"),
            Feature::Metadata => write!(f, "metadata"),
        }
    }
}
