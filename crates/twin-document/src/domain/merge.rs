//! Entry diffing shared by the property and tag containers
//!
//! Both containers hold their entries as `Option<PropertyMap>`: `None` until
//! the first mutation, so "never touched" and "explicitly emptied" stay
//! distinguishable.

use serde_json::Value;

use super::PropertyMap;

/// Entries of `incoming` that are new or differ from `current`.
pub fn changed_entries(current: Option<&PropertyMap>, incoming: &PropertyMap) -> PropertyMap {
    incoming
        .iter()
        .filter(|(key, value)| current.and_then(|map| map.get(key.as_str())) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Store `incoming` into `entries`, keeping explicit nulls.
///
/// Returns the changed subset; `entries` is only materialised when something
/// actually changed.
pub fn merge_entries(entries: &mut Option<PropertyMap>, incoming: &PropertyMap) -> PropertyMap {
    let changed = changed_entries(entries.as_ref(), incoming);
    if !changed.is_empty() {
        let stored = entries.get_or_insert_with(PropertyMap::new);
        for (key, value) in &changed {
            stored.insert(key.clone(), value.clone());
        }
    }
    changed
}

/// Apply a parsed object where `null` means "delete this key".
///
/// Deleted keys show up in the returned subset with a `null` value.
pub fn apply_parsed_entries(entries: &mut Option<PropertyMap>, parsed: PropertyMap) -> PropertyMap {
    let mut changed = PropertyMap::new();

    for (key, value) in parsed {
        if value.is_null() {
            let removed = entries
                .as_mut()
                .and_then(|stored| stored.shift_remove(&key))
                .is_some();
            if removed {
                changed.insert(key, Value::Null);
            }
            continue;
        }

        let current = entries.as_ref().and_then(|stored| stored.get(&key));
        if current != Some(&value) {
            entries
                .get_or_insert_with(PropertyMap::new)
                .insert(key.clone(), value.clone());
            changed.insert(key, value);
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> PropertyMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_changed_entries_against_absent_map() {
        let incoming = map(json!({"a": 1, "b": null}));
        assert_eq!(changed_entries(None, &incoming), incoming);
    }

    #[test]
    fn test_changed_entries_skips_equal_values() {
        let current = map(json!({"a": 1, "b": "x"}));
        let incoming = map(json!({"a": 1, "b": "y", "c": true}));
        assert_eq!(
            changed_entries(Some(&current), &incoming),
            map(json!({"b": "y", "c": true}))
        );
    }

    #[test]
    fn test_merge_keeps_nulls() {
        let mut entries = Some(map(json!({"a": 1})));
        let changed = merge_entries(&mut entries, &map(json!({"a": null})));
        assert_eq!(changed, map(json!({"a": null})));
        assert_eq!(entries, Some(map(json!({"a": null}))));
    }

    #[test]
    fn test_merge_without_change_leaves_absent_map_absent() {
        let mut entries = None;
        let changed = merge_entries(&mut entries, &PropertyMap::new());
        assert!(changed.is_empty());
        assert!(entries.is_none());
    }

    #[test]
    fn test_apply_parsed_null_deletes() {
        let mut entries = Some(map(json!({"a": 1, "b": 2})));
        let changed = apply_parsed_entries(&mut entries, map(json!({"a": null, "zz": null})));
        assert_eq!(changed, map(json!({"a": null})));
        assert_eq!(entries, Some(map(json!({"b": 2}))));
    }

    #[test]
    fn test_apply_parsed_updates_and_adds() {
        let mut entries = None;
        let changed = apply_parsed_entries(&mut entries, map(json!({"a": 1})));
        assert_eq!(changed, map(json!({"a": 1})));

        let changed = apply_parsed_entries(&mut entries, map(json!({"a": 1, "b": {"c": 2}})));
        assert_eq!(changed, map(json!({"b": {"c": 2}})));
        assert_eq!(entries, Some(map(json!({"a": 1, "b": {"c": 2}}))));
    }
}
