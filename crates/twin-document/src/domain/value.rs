//! Property value validation
//!
//! Values are JSON trees restricted to null, booleans, numbers, strings and
//! objects. Arrays are not part of the twin value model. Objects may nest,
//! but no deeper than [`MAX_NESTING_DEPTH`] levels under one property.

use serde_json::Value;

use super::key::validate_key;
use super::PropertyMap;
use crate::error::{TwinError, ValueViolation};

/// Maximum number of nested object levels under a single property
pub const MAX_NESTING_DEPTH: usize = 5;

/// Validate `value`, stored under `key`, sitting `depth` object levels deep.
///
/// Top-level property values are validated at depth 0; an object value
/// counts as one level, its object children as the next, and so on.
pub fn validate_value(key: &str, value: &Value, depth: usize) -> Result<(), TwinError> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
        Value::Object(children) => {
            let depth = depth + 1;
            if depth > MAX_NESTING_DEPTH {
                return Err(TwinError::InvalidValue {
                    key: key.to_string(),
                    reason: ValueViolation::DepthExceeded {
                        max: MAX_NESTING_DEPTH,
                    },
                });
            }
            for (child_key, child) in children {
                validate_key(child_key)?;
                validate_value(child_key, child, depth)?;
            }
            Ok(())
        }
        Value::Array(_) => Err(TwinError::InvalidValue {
            key: key.to_string(),
            reason: ValueViolation::UnsupportedType("array"),
        }),
    }
}

/// Validate every key and value of a map.
///
/// Stops at the first failure; callers rely on this running to completion
/// before they touch any state.
pub fn validate_entries(entries: &PropertyMap) -> Result<(), TwinError> {
    for (key, value) in entries {
        validate_key(key)?;
        validate_value(key, value, 0)?;
    }
    Ok(())
}
