//! Tag container
//!
//! Tags follow the property key/value rules but carry no metadata and no
//! version. The container is inert until enabled.

use super::merge::{apply_parsed_entries, merge_entries};
use super::value::validate_entries;
use super::PropertyMap;
use crate::error::{Feature, TwinError};

#[derive(Debug, Clone, Default)]
pub struct TagsContainer {
    enabled: bool,
    entries: Option<PropertyMap>,
}

impl TagsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable tags. Idempotent; there is no way back.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn ensure_enabled(&self) -> Result<(), TwinError> {
        if self.enabled {
            Ok(())
        } else {
            Err(TwinError::FeatureDisabled(Feature::Tags))
        }
    }

    /// Merge `incoming`; `Ok(None)` when nothing changed.
    pub fn merge_update(&mut self, incoming: &PropertyMap) -> Result<Option<PropertyMap>, TwinError> {
        self.ensure_enabled()?;
        if incoming.is_empty() {
            return Ok(None);
        }
        validate_entries(incoming)?;

        let changed = merge_entries(&mut self.entries, incoming);
        Ok((!changed.is_empty()).then_some(changed))
    }

    /// Replace all tags with `incoming` and return the new content.
    pub fn reset(&mut self, incoming: &PropertyMap) -> Result<PropertyMap, TwinError> {
        self.ensure_enabled()?;
        validate_entries(incoming)?;

        self.entries = Some(incoming.clone());
        Ok(incoming.clone())
    }

    /// Apply a parsed object where `null` deletes a tag.
    pub fn apply_parsed(&mut self, parsed: PropertyMap) -> Result<PropertyMap, TwinError> {
        self.ensure_enabled()?;
        Ok(apply_parsed_entries(&mut self.entries, parsed))
    }

    /// Current tags, `None` if never mutated.
    pub fn snapshot(&self) -> Result<Option<PropertyMap>, TwinError> {
        self.ensure_enabled()?;
        Ok(self.entries.clone())
    }
}
