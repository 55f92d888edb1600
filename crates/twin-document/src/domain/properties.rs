//! Desired / reported property container

use std::collections::BTreeMap;

use serde_json::Value;

use super::merge::{apply_parsed_entries, merge_entries};
use super::metadata::PropertyMetadata;
use super::value::validate_entries;
use super::PropertyMap;
use crate::error::TwinError;

/// One parsed `desired` or `reported` section, pseudo-keys already split off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionUpdate {
    /// Property entries; `null` values request deletion
    pub entries: PropertyMap,
    /// Section `$version`, if the document carried one
    pub version: Option<i64>,
    /// Section `$metadata` entries
    pub metadata: BTreeMap<String, PropertyMetadata>,
}

/// Ordered property map with optional per-key metadata and an opaque
/// section version.
#[derive(Debug, Clone, Default)]
pub struct PropertyContainer {
    entries: Option<PropertyMap>,
    /// `Some` once metadata has been enabled
    metadata: Option<BTreeMap<String, PropertyMetadata>>,
    version: Option<i64>,
}

impl PropertyContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking per-key metadata. Idempotent.
    pub fn enable_metadata(&mut self) {
        if self.metadata.is_none() {
            self.metadata = Some(BTreeMap::new());
        }
    }

    pub fn metadata_enabled(&self) -> bool {
        self.metadata.is_some()
    }

    /// Merge `incoming` into the container.
    ///
    /// Returns `Ok(None)` when nothing changed, otherwise the changed subset.
    /// Null values are stored (and suppressed from rendered JSON).
    pub fn merge_update(
        &mut self,
        incoming: &PropertyMap,
        now: &str,
    ) -> Result<Option<PropertyMap>, TwinError> {
        if incoming.is_empty() {
            return Ok(None);
        }
        validate_entries(incoming)?;

        let changed = merge_entries(&mut self.entries, incoming);
        if changed.is_empty() {
            return Ok(None);
        }
        self.stamp(&changed, now);
        Ok(Some(changed))
    }

    /// Replace the whole content with `incoming` and return the new content.
    ///
    /// An empty `incoming` leaves an explicit, present-but-empty container.
    pub fn reset(&mut self, incoming: &PropertyMap, now: &str) -> Result<PropertyMap, TwinError> {
        validate_entries(incoming)?;

        self.entries = Some(incoming.clone());
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.clear();
        }
        self.stamp(incoming, now);
        Ok(incoming.clone())
    }

    /// Apply a parsed object: changed values are stored, `null` deletes.
    pub fn apply_parsed(&mut self, parsed: PropertyMap, now: &str) -> PropertyMap {
        let changed = apply_parsed_entries(&mut self.entries, parsed);
        self.stamp(&changed, now);
        changed
    }

    /// Apply a parsed section including its `$version` and `$metadata`.
    pub fn apply_section(&mut self, section: SectionUpdate, now: &str) -> PropertyMap {
        let changed = self.apply_parsed(section.entries, now);

        if section.version.is_some() {
            self.version = section.version;
        }

        if let (Some(metadata), Some(entries)) = (self.metadata.as_mut(), self.entries.as_ref()) {
            for (key, parsed) in section.metadata {
                if entries.contains_key(&key) {
                    metadata.insert(key, parsed);
                }
            }
        }

        changed
    }

    /// Stamp metadata for the changed keys; deleted keys lose theirs.
    fn stamp(&mut self, changed: &PropertyMap, now: &str) {
        let Some(metadata) = self.metadata.as_mut() else {
            return;
        };
        let entries = self.entries.as_ref();

        for key in changed.keys() {
            if entries.is_some_and(|entries| entries.contains_key(key)) {
                metadata.entry(key.clone()).or_default().touch(now);
            } else {
                metadata.remove(key);
            }
        }
    }

    /// Current entries, or `None` if the container was never mutated.
    pub fn snapshot(&self) -> Option<PropertyMap> {
        self.entries.clone()
    }

    /// Iterate over entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter().flat_map(|entries| entries.iter())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.as_ref().and_then(|entries| entries.get(key))
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, PropertyMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Section version last received from the service
    pub fn version(&self) -> Option<i64> {
        self.version
    }

    /// Metadata of one key; `None` when metadata is disabled or the key is
    /// unknown.
    pub fn metadata(&self, key: &str) -> Option<&PropertyMetadata> {
        self.metadata.as_ref().and_then(|metadata| metadata.get(key))
    }
}
