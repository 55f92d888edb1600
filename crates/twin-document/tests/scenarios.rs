//! # Twin Document Scenarios
//!
//! End-to-end behavior of `TwinDocument` through its public API.
//!
//! ## Test Categories
//!
//! 1. **Property updates** - merge, reset, idempotence, atomicity
//! 2. **Callbacks** - dispatch rules and panics
//! 3. **Tags** - feature gating
//! 4. **Device management** - id and status handling

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use twin_document::{
    ChangeKind, DeviceStatus, Feature, FixedTimeSource, KeyViolation, PropertyMap, TwinConfig,
    TwinDocument, TwinError, ValueViolation,
};

// =============================================================================
// TEST HELPERS
// =============================================================================

const NOW: &str = "2017-09-21T02:07:44.2380Z";

fn map(value: Value) -> PropertyMap {
    value
        .as_object()
        .cloned()
        .unwrap_or_else(|| panic!("not an object: {value}"))
}

fn make_twin(config: TwinConfig) -> TwinDocument {
    TwinDocument::with_time_source(config, Arc::new(FixedTimeSource::new(NOW)))
}

fn record(twin: &mut TwinDocument, kind: ChangeKind) -> Arc<Mutex<Vec<PropertyMap>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    twin.set_callback(kind, move |changed| sink.lock().unwrap().push(changed));
    seen
}

/// Object value nested `levels` deep under one property
fn nested(levels: usize) -> Value {
    let mut value = json!("leaf");
    for level in (1..=levels).rev() {
        let mut inner = PropertyMap::new();
        inner.insert(format!("level{level}"), value);
        value = Value::Object(inner);
    }
    value
}

fn scenario_a() -> TwinDocument {
    let mut twin = make_twin(TwinConfig::default());
    twin.update_desired(&map(json!({"key1": "value1", "key2": 1234, "key3": "value3"})))
        .unwrap();
    twin
}

// =============================================================================
// PROPERTY UPDATES
// =============================================================================

#[test]
fn scenario_a_first_update_returns_everything_then_nothing() {
    let mut twin = make_twin(TwinConfig::default());
    let update = map(json!({"key1": "value1", "key2": 1234, "key3": "value3"}));

    assert_eq!(twin.update_desired(&update).unwrap(), Some(update.clone()));
    assert_eq!(twin.update_desired(&update).unwrap(), None);
    assert_eq!(twin.desired_map().map(|m| m.len()), Some(3));
}

#[test]
fn scenario_b_partial_update_returns_only_changed_key() {
    let mut twin = scenario_a();
    assert_eq!(
        twin.update_desired(&map(json!({"key1": "value4"}))).unwrap(),
        Some(map(json!({"key1": "value4"})))
    );
    let desired = twin.desired_map().unwrap();
    assert_eq!(desired.len(), 3);
    assert_eq!(desired["key1"], json!("value4"));
}

#[test]
fn scenario_c_reset_replaces_content() {
    let mut twin = scenario_a();
    let replacement = map(json!({"key1": "value4", "key2": 1234, "key5": "value5"}));

    assert_eq!(twin.reset_desired(&replacement).unwrap(), replacement);
    let desired = twin.desired_map().unwrap();
    assert!(!desired.contains_key("key3"));
    assert_eq!(desired, replacement);
}

#[test]
fn scenario_d_illegal_key_leaves_state_unchanged() {
    let mut twin = scenario_a();
    let before = twin.desired_map();

    let err = twin
        .update_desired(&map(json!({"illegal.key": "v"})))
        .unwrap_err();
    assert_eq!(
        err,
        TwinError::InvalidKey {
            key: "illegal.key".to_string(),
            reason: KeyViolation::IllegalCharacter('.'),
        }
    );
    assert_eq!(twin.desired_map(), before);
}

#[test]
fn empty_update_is_a_noop() {
    let mut twin = make_twin(TwinConfig::default());
    let seen = record(&mut twin, ChangeKind::Desired);

    assert_eq!(twin.update_desired(&PropertyMap::new()).unwrap(), None);
    assert_eq!(twin.desired_map(), None);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn one_invalid_entry_rejects_the_whole_map() {
    let mut twin = scenario_a();
    let before = twin.to_text();

    let result = twin.update_desired(&map(json!({
        "key1": "changed",
        "key9": "new",
        "bad": [1, 2, 3]
    })));
    assert_eq!(
        result,
        Err(TwinError::InvalidValue {
            key: "bad".to_string(),
            reason: ValueViolation::UnsupportedType("array"),
        })
    );
    assert_eq!(twin.to_text(), before);
}

#[test]
fn keys_are_case_sensitive() {
    let mut twin = make_twin(TwinConfig::default());
    let changed = twin
        .update_reported(&map(json!({"key1": 1, "kEy1": 2})))
        .unwrap()
        .unwrap();
    assert_eq!(changed.len(), 2);
    assert_eq!(twin.reported_map().unwrap().len(), 2);
}

#[test]
fn nesting_depth_limit() {
    let mut twin = make_twin(TwinConfig::default());

    let mut five = PropertyMap::new();
    five.insert("deep".to_string(), nested(5));
    assert!(twin.update_desired(&five).unwrap().is_some());

    let mut six = PropertyMap::new();
    six.insert("deeper".to_string(), nested(6));
    assert!(matches!(
        twin.update_desired(&six),
        Err(TwinError::InvalidValue {
            reason: ValueViolation::DepthExceeded { .. },
            ..
        })
    ));
    assert!(!twin.desired_map().unwrap().contains_key("deeper"));
}

#[test]
fn null_is_stored_by_update_but_not_rendered() {
    let mut twin = scenario_a();
    let changed = twin.update_desired(&map(json!({"key3": null}))).unwrap();
    assert_eq!(changed, Some(map(json!({"key3": null}))));

    assert_eq!(twin.desired_map().unwrap()["key3"], Value::Null);
    assert_eq!(
        twin.to_text(),
        r#"{"properties":{"desired":{"key1":"value1","key2":1234},"reported":{}}}"#
    );
}

#[test]
fn never_mutated_differs_from_reset_to_empty() {
    let mut twin = make_twin(TwinConfig::default());
    assert_eq!(twin.reported_map(), None);

    let content = twin.reset_reported(&PropertyMap::new()).unwrap();
    assert!(content.is_empty());
    assert_eq!(twin.reported_map(), Some(PropertyMap::new()));
}

// =============================================================================
// CALLBACKS
// =============================================================================

#[test]
fn callbacks_only_see_their_section() {
    let mut twin = make_twin(TwinConfig::default());
    let desired = record(&mut twin, ChangeKind::Desired);
    let reported = record(&mut twin, ChangeKind::Reported);

    twin.update_reported(&map(json!({"temp": 21.5}))).unwrap();

    assert!(desired.lock().unwrap().is_empty());
    assert_eq!(reported.lock().unwrap().as_slice(), &[map(json!({"temp": 21.5}))]);
}

#[test]
fn cleared_callback_stops_firing() {
    let mut twin = make_twin(TwinConfig::default());
    let seen = record(&mut twin, ChangeKind::Desired);
    twin.update_desired(&map(json!({"a": 1}))).unwrap();

    twin.clear_callback(ChangeKind::Desired);
    twin.update_desired(&map(json!({"a": 2}))).unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn panicking_callback_leaves_state_committed() {
    let mut twin = make_twin(TwinConfig::default());
    twin.set_callback(ChangeKind::Desired, |_| panic!("callback failure"));

    let result = catch_unwind(AssertUnwindSafe(|| {
        let _ = twin.update_desired(&map(json!({"a": 1})));
    }));
    assert!(result.is_err());
    assert_eq!(twin.desired_map(), Some(map(json!({"a": 1}))));
}

#[test]
fn full_document_fires_only_non_empty_sections() {
    let mut twin = make_twin(TwinConfig::default().with_tags());
    let desired = record(&mut twin, ChangeKind::Desired);
    let reported = record(&mut twin, ChangeKind::Reported);
    let tags = record(&mut twin, ChangeKind::Tags);

    twin.apply_full_document(
        r#"{"tags":{},"properties":{"desired":{"fan":"on"},"reported":{}}}"#,
    )
    .unwrap();

    assert_eq!(desired.lock().unwrap().as_slice(), &[map(json!({"fan": "on"}))]);
    assert!(reported.lock().unwrap().is_empty());
    assert!(tags.lock().unwrap().is_empty());
}

#[test]
fn parsed_null_deletes_and_reports_deletion() {
    let mut twin = scenario_a();
    let seen = record(&mut twin, ChangeKind::Desired);

    twin.apply_full_document(r#"{"desired":{"key2":null,"key4":true}}"#)
        .unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[map(json!({"key2": null, "key4": true}))]
    );
    let desired = twin.desired_map().unwrap();
    assert!(!desired.contains_key("key2"));
    assert_eq!(desired.len(), 3);
}

// =============================================================================
// TAGS
// =============================================================================

#[test]
fn tags_require_enabling() {
    let mut twin = make_twin(TwinConfig::default());
    let disabled = TwinError::FeatureDisabled(Feature::Tags);

    assert_eq!(twin.update_tags(&map(json!({"a": 1}))), Err(disabled.clone()));
    assert_eq!(twin.reset_tags(&PropertyMap::new()), Err(disabled.clone()));
    assert_eq!(twin.tags_map(), Err(disabled.clone()));
    assert_eq!(twin.apply_full_document(r#"{"tags":{"a":1}}"#), Err(disabled));

    twin.enable_tags();
    twin.enable_tags();
    assert_eq!(twin.tags_map(), Ok(None));
    assert!(twin.update_tags(&map(json!({"a": 1}))).unwrap().is_some());
}

#[test]
fn tags_callback_receives_changed_tags() {
    let mut twin = make_twin(TwinConfig::default().with_tags());
    let seen = record(&mut twin, ChangeKind::Tags);

    twin.update_tags(&map(json!({"site": "north", "rack": 4}))).unwrap();
    twin.update_tags(&map(json!({"site": "south", "rack": 4}))).unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[
            map(json!({"site": "north", "rack": 4})),
            map(json!({"site": "south"}))
        ]
    );
}

// =============================================================================
// DEVICE MANAGEMENT
// =============================================================================

#[test]
fn device_id_only_renders_minimal_document() {
    let mut twin = make_twin(TwinConfig::default());
    let text = twin
        .update_device_management("myDevice", None, None)
        .unwrap();
    assert_eq!(
        text.as_deref(),
        Some(r#"{"deviceId":"myDevice","properties":{"desired":{},"reported":{}}}"#)
    );
    assert_eq!(twin.update_device_management("myDevice", None, None), Ok(None));
}

#[test]
fn invalid_device_id_rejected() {
    let mut twin = make_twin(TwinConfig::default());
    for id in ["", "white space", "slash/id"] {
        assert!(matches!(
            twin.update_device_management(id, None, None),
            Err(TwinError::IllegalArgument(_))
        ));
    }
    assert!(twin.set_device_id(&"x".repeat(129)).is_err());
    assert_eq!(twin.management().device_id, None);
}

#[test]
fn status_change_stamps_time() {
    let mut twin = make_twin(TwinConfig::default());
    twin.update_device_management("dev", Some(DeviceStatus::Disabled), Some("suspended"))
        .unwrap();

    let management = twin.management();
    assert_eq!(management.status, Some(DeviceStatus::Disabled));
    assert_eq!(management.status_reason.as_deref(), Some("suspended"));
    assert_eq!(management.status_updated_time.as_deref(), Some(NOW));
}
