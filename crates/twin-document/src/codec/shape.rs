//! Structural shape validation
//!
//! A twin document comes in one of two mutually exclusive layouts:
//!
//! ```text
//! full twin:        {"deviceId":..,"status":..,"tags":{..},
//!                    "properties":{"desired":{..},"reported":{..}}}
//! properties only:  {"desired":{..},"reported":{..}}
//! ```
//!
//! Parsing produces a [`StagedUpdate`] that has passed every shape, key and
//! value check, so committing it cannot fail halfway.

use std::collections::BTreeMap;

use serde_json::value::RawValue;
use serde_json::Value;

use super::raw::{json_type_name, parse_object, RawEntries};
use crate::domain::management::MANAGEMENT_TAGS;
use crate::domain::{
    validate_entries, DeviceManagement, PropertyMap, PropertyMetadata, SectionUpdate,
};
use crate::error::{Feature, TwinError};

pub const TAGS_TAG: &str = "tags";
pub const PROPERTIES_TAG: &str = "properties";
pub const DESIRED_TAG: &str = "desired";
pub const REPORTED_TAG: &str = "reported";
pub const VERSION_TAG: &str = "$version";
pub const METADATA_TAG: &str = "$metadata";

/// Feature state the parser checks documents against
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeContext {
    pub tags_enabled: bool,
    /// Parsed `$metadata` is dropped unless set
    pub metadata_enabled: bool,
}

/// A fully validated document, ready to commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedUpdate {
    /// Replacement management record, when the document carries any
    /// management field
    pub management: Option<DeviceManagement>,
    pub tags: Option<PropertyMap>,
    pub desired: Option<SectionUpdate>,
    pub reported: Option<SectionUpdate>,
}

fn shape_error(message: impl Into<String>) -> TwinError {
    TwinError::StructuralShape(message.into())
}

fn reject_duplicates(entries: &RawEntries, context: &str) -> Result<(), TwinError> {
    match entries.first_duplicate() {
        Some(key) => Err(shape_error(format!("duplicated key {key:?} in {context}"))),
        None => Ok(()),
    }
}

/// Parse and validate a complete twin document.
pub fn parse_document(text: &str, context: ShapeContext) -> Result<StagedUpdate, TwinError> {
    let top = RawEntries::parse(text, "twin document")?;
    reject_duplicates(&top, "twin document")?;

    let properties_only = top
        .keys()
        .any(|key| key == DESIRED_TAG || key == REPORTED_TAG);

    if properties_only {
        parse_properties_block(&top, "properties-only document", context)
    } else {
        parse_full_twin(top, context)
    }
}

fn parse_full_twin(top: RawEntries, context: ShapeContext) -> Result<StagedUpdate, TwinError> {
    let mut staged = StagedUpdate::default();
    let mut management = PropertyMap::new();

    for (key, raw) in &top.0 {
        match key.as_str() {
            PROPERTIES_TAG => {
                let block = RawEntries::parse(raw.get(), PROPERTIES_TAG)?;
                reject_duplicates(&block, PROPERTIES_TAG)?;
                let sections = parse_properties_block(&block, PROPERTIES_TAG, context)?;
                staged.desired = sections.desired;
                staged.reported = sections.reported;
            }
            TAGS_TAG => {
                if !context.tags_enabled {
                    return Err(TwinError::FeatureDisabled(Feature::Tags));
                }
                let tags = parse_object(raw, TAGS_TAG)?;
                validate_entries(&tags)?;
                staged.tags = Some(tags);
            }
            field if MANAGEMENT_TAGS.contains(&field) => {
                management.insert(key.clone(), serde_json::from_str::<Value>(raw.get())?);
            }
            unknown => {
                return Err(shape_error(format!(
                    "unrecognized top-level key {unknown:?}"
                )));
            }
        }
    }

    if !management.is_empty() {
        staged.management = Some(DeviceManagement::from_fields(management)?);
    }

    Ok(staged)
}

/// Parse an object that may only hold `desired` and `reported`.
fn parse_properties_block(
    block: &RawEntries,
    location: &str,
    context: ShapeContext,
) -> Result<StagedUpdate, TwinError> {
    let mut staged = StagedUpdate::default();

    for (key, raw) in &block.0 {
        match key.as_str() {
            DESIRED_TAG => staged.desired = Some(parse_section(raw, DESIRED_TAG, context)?),
            REPORTED_TAG => staged.reported = Some(parse_section(raw, REPORTED_TAG, context)?),
            other => {
                return Err(shape_error(format!(
                    "unexpected key {other:?} in {location}"
                )));
            }
        }
    }

    Ok(staged)
}

/// Parse one `desired` / `reported` section.
///
/// `$version` and `$metadata` are split off; every other key must be a valid
/// property key. Repeated property keys resolve last-wins.
pub fn parse_section(
    raw: &RawValue,
    section: &str,
    context: ShapeContext,
) -> Result<SectionUpdate, TwinError> {
    let mut entries = parse_object(raw, section)?;

    let version = match entries.shift_remove(VERSION_TAG) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_i64().ok_or_else(|| {
            shape_error(format!(
                "{section} {VERSION_TAG} must be an integer, found {}",
                json_type_name(&value)
            ))
        })?),
    };

    let metadata = match entries.shift_remove(METADATA_TAG) {
        Some(Value::Object(block)) if context.metadata_enabled => {
            parse_metadata_block(block, section)?
        }
        _ => BTreeMap::new(),
    };

    validate_entries(&entries)?;

    Ok(SectionUpdate {
        entries,
        version,
        metadata,
    })
}

/// Per-key entries of a `$metadata` block.
///
/// Section-level stamps (`$lastUpdated`, `$lastUpdatedVersion`) and
/// non-object entries are skipped.
fn parse_metadata_block(
    block: PropertyMap,
    section: &str,
) -> Result<BTreeMap<String, PropertyMetadata>, TwinError> {
    block
        .into_iter()
        .filter(|(key, value)| !key.starts_with('$') && value.is_object())
        .map(|(key, value)| {
            let metadata = serde_json::from_value::<PropertyMetadata>(value).map_err(|e| {
                shape_error(format!("{section} {METADATA_TAG} for {key:?}: {e}"))
            })?;
            Ok((key, metadata))
        })
        .collect()
}

/// Parse a standalone section document such as `{"k":1,"$version":3}`.
pub fn parse_section_document(
    text: &str,
    section: &str,
    context: ShapeContext,
) -> Result<SectionUpdate, TwinError> {
    let raw: Box<RawValue> = serde_json::from_str(text)?;
    parse_section(&raw, section, context)
}
