//! Duplicate-preserving JSON object reader
//!
//! `serde_json::Value` collapses repeated keys (last wins). Structural keys
//! must not repeat, so the top levels of a document are read as a list of
//! `(key, raw value)` pairs instead, and only the leaf sections are parsed
//! into ordinary maps.

use std::collections::HashSet;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::domain::PropertyMap;
use crate::error::TwinError;

/// Entries of one JSON object in document order, duplicates included
#[derive(Debug)]
pub struct RawEntries(pub Vec<(String, Box<RawValue>)>);

impl RawEntries {
    /// Parse an object, naming `context` in the error if it is not one.
    pub fn parse(json: &str, context: &str) -> Result<Self, TwinError> {
        serde_json::from_str(json)
            .map_err(|e| TwinError::StructuralShape(format!("{context}: {e}")))
    }

    /// First key that occurs more than once
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.0.len());
        self.keys().find(|key| !seen.insert(*key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }
}

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Box<RawValue>>()? {
                    entries.push((key, value));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parse a leaf section into an ordered map; repeated keys resolve
/// last-wins.
pub fn parse_object(raw: &RawValue, context: &str) -> Result<PropertyMap, TwinError> {
    match serde_json::from_str::<Value>(raw.get())? {
        Value::Object(map) => Ok(map),
        other => Err(TwinError::StructuralShape(format!(
            "{context} must be an object, found {}",
            json_type_name(&other)
        ))),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
