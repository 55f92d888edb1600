//! Twin document configuration
//!
//! # Example
//!
//! ```ignore
//! use twin_document::TwinConfig;
//!
//! let config = TwinConfig::default().with_tags().with_metadata();
//! ```

use serde::{Deserialize, Serialize};
use std::env;

pub const ENABLE_TAGS_VAR: &str = "TWIN_ENABLE_TAGS";
pub const ENABLE_METADATA_VAR: &str = "TWIN_ENABLE_METADATA";

/// Opt-in features applied when a document is created.
///
/// Both features can also be switched on later; neither can be switched off.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinConfig {
    /// Render and accept the `tags` section
    pub tags_enabled: bool,
    /// Track and render per-key `$metadata`
    pub metadata_enabled: bool,
}

impl TwinConfig {
    /// Create configuration from environment variables.
    ///
    /// - `TWIN_ENABLE_TAGS`: enable tags (default: false)
    /// - `TWIN_ENABLE_METADATA`: enable metadata (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| {
            lookup(name)
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false)
        };

        Self {
            tags_enabled: flag(ENABLE_TAGS_VAR),
            metadata_enabled: flag(ENABLE_METADATA_VAR),
        }
    }

    /// Builder-style method to enable tags
    pub fn with_tags(mut self) -> Self {
        self.tags_enabled = true;
        self
    }

    /// Builder-style method to enable metadata
    pub fn with_metadata(mut self) -> Self {
        self.metadata_enabled = true;
        self
    }
}
