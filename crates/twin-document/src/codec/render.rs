//! Canonical JSON rendering
//!
//! Key order is fixed: management fields, `tags`, then `properties`. Inside a
//! section the entries come first in insertion order, then `$metadata`, then
//! `$version`. Stored `null` values are never rendered.

use serde_json::Value;

use super::shape::{DESIRED_TAG, METADATA_TAG, PROPERTIES_TAG, REPORTED_TAG, TAGS_TAG, VERSION_TAG};
use crate::domain::{DeviceManagement, PropertyContainer, PropertyMap};

fn non_null<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>) -> PropertyMap {
    entries
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Render one `desired` / `reported` section.
pub fn render_section(container: &PropertyContainer) -> Value {
    let mut section = non_null(container.entries());

    if container.metadata_enabled() {
        let metadata: PropertyMap = section
            .keys()
            .filter_map(|key| {
                container
                    .metadata(key)
                    .map(|metadata| (key.clone(), metadata.to_json()))
            })
            .collect();
        section.insert(METADATA_TAG.to_string(), Value::Object(metadata));
    }

    if let Some(version) = container.version() {
        section.insert(VERSION_TAG.to_string(), Value::from(version));
    }

    Value::Object(section)
}

/// Render the `tags` section from a snapshot.
pub fn render_tags(tags: Option<&PropertyMap>) -> Value {
    Value::Object(non_null(tags.into_iter().flatten()))
}

/// Assemble a full-twin object from already rendered parts.
///
/// `tags` is `None` when tags are disabled, which omits the key entirely.
pub fn assemble(
    management: &DeviceManagement,
    tags: Option<Value>,
    desired: Value,
    reported: Value,
) -> Value {
    let mut document = management.to_json_map();

    if let Some(tags) = tags {
        document.insert(TAGS_TAG.to_string(), tags);
    }

    let mut properties = PropertyMap::new();
    properties.insert(DESIRED_TAG.to_string(), desired);
    properties.insert(REPORTED_TAG.to_string(), reported);
    document.insert(PROPERTIES_TAG.to_string(), Value::Object(properties));

    Value::Object(document)
}

/// Render the changes produced by one combined update.
///
/// Unlike the full render, `null` entries are kept: they tell the receiving
/// side to delete the key.
pub fn render_diff(
    management: &DeviceManagement,
    tags: Option<PropertyMap>,
    desired: PropertyMap,
    reported: PropertyMap,
) -> String {
    assemble(
        management,
        tags.map(Value::Object),
        Value::Object(desired),
        Value::Object(reported),
    )
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceStatus;
    use serde_json::json;

    const T0: &str = "2024-05-01T10:00:00.0000Z";

    fn map(value: Value) -> PropertyMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_empty_section() {
        assert_eq!(render_section(&PropertyContainer::new()).to_string(), "{}");

        let mut container = PropertyContainer::new();
        container.enable_metadata();
        assert_eq!(render_section(&container).to_string(), r#"{"$metadata":{}}"#);
    }

    #[test]
    fn test_section_order_and_null_suppression() {
        let mut container = PropertyContainer::new();
        container.enable_metadata();
        container
            .merge_update(&map(json!({"b": 1, "a": "x", "gone": null})), T0)
            .unwrap();

        assert_eq!(
            render_section(&container).to_string(),
            format!(
                r#"{{"b":1,"a":"x","$metadata":{{"b":{{"$lastUpdated":"{T0}"}},"a":{{"$lastUpdated":"{T0}"}}}}}}"#
            )
        );
    }

    #[test]
    fn test_tags_render() {
        assert_eq!(render_tags(None).to_string(), "{}");
        let tags = map(json!({"site": "north", "old": null}));
        assert_eq!(render_tags(Some(&tags)).to_string(), r#"{"site":"north"}"#);
    }

    #[test]
    fn test_assemble_key_order() {
        let management = DeviceManagement {
            device_id: Some("dev-1".to_string()),
            status: Some(DeviceStatus::Enabled),
            ..Default::default()
        };
        let document = assemble(&management, Some(json!({})), json!({}), json!({"k": 1}));
        assert_eq!(
            document.to_string(),
            r#"{"deviceId":"dev-1","status":"enabled","tags":{},"properties":{"desired":{},"reported":{"k":1}}}"#
        );
    }

    #[test]
    fn test_diff_keeps_nulls() {
        let text = render_diff(
            &DeviceManagement::default(),
            None,
            map(json!({"a": null})),
            PropertyMap::new(),
        );
        assert_eq!(text, r#"{"properties":{"desired":{"a":null},"reported":{}}}"#);
    }
}
