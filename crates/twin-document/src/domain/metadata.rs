//! Per-key revision metadata

use serde::Deserialize;
use serde_json::Value;

use super::PropertyMap;

pub const LAST_UPDATED_TAG: &str = "$lastUpdated";
pub const LAST_UPDATED_VERSION_TAG: &str = "$lastUpdatedVersion";

/// Last-update stamp of a single property.
///
/// `last_updated_version` is assigned by the service and only carried
/// through; it is never computed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyMetadata {
    #[serde(rename = "$lastUpdated", default)]
    pub last_updated: Option<String>,
    #[serde(rename = "$lastUpdatedVersion", default)]
    pub last_updated_version: Option<i64>,
}

impl PropertyMetadata {
    /// Stamp the update time, keeping the carried version.
    pub fn touch(&mut self, now: &str) {
        self.last_updated = Some(now.to_string());
    }

    pub fn to_json(&self) -> Value {
        let mut map = PropertyMap::new();
        if let Some(last_updated) = &self.last_updated {
            map.insert(LAST_UPDATED_TAG.to_string(), Value::from(last_updated.as_str()));
        }
        if let Some(version) = self.last_updated_version {
            map.insert(LAST_UPDATED_VERSION_TAG.to_string(), Value::from(version));
        }
        Value::Object(map)
    }
}
