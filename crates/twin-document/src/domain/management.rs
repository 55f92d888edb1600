//! Device management fields
//!
//! Identity, lifecycle status and connectivity attributes that travel at the
//! top level of a full twin document. Every field is optional and only
//! present fields are rendered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PropertyMap;
use crate::error::TwinError;

/// Maximum device id length in characters
pub const MAX_DEVICE_ID_LENGTH: usize = 128;

/// Non-alphanumeric ASCII characters allowed in a device id
const DEVICE_ID_SYMBOLS: &str = "-:.+%_#*?!(),=@;$'";

pub const DEVICE_ID_TAG: &str = "deviceId";
pub const GENERATION_ID_TAG: &str = "generationId";
pub const ETAG_TAG: &str = "etag";
pub const STATUS_TAG: &str = "status";
pub const STATUS_REASON_TAG: &str = "statusReason";
pub const STATUS_UPDATED_TIME_TAG: &str = "statusUpdatedTime";
pub const CONNECTION_STATE_TAG: &str = "connectionState";
pub const CONNECTION_STATE_UPDATED_TIME_TAG: &str = "connectionStateUpdatedTime";
pub const LAST_ACTIVITY_TIME_TAG: &str = "lastActivityTime";

/// Top-level keys that belong to the management record, in render order
pub const MANAGEMENT_TAGS: [&str; 9] = [
    DEVICE_ID_TAG,
    GENERATION_ID_TAG,
    ETAG_TAG,
    STATUS_TAG,
    STATUS_REASON_TAG,
    STATUS_UPDATED_TIME_TAG,
    CONNECTION_STATE_TAG,
    CONNECTION_STATE_UPDATED_TIME_TAG,
    LAST_ACTIVITY_TIME_TAG,
];

/// Device lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Enabled,
    Disabled,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Enabled => "enabled",
            DeviceStatus::Disabled => "disabled",
        }
    }
}

/// Device connectivity as last seen by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

/// Management record of one device.
///
/// Parsed as a whole from a full-twin document: fields the document leaves
/// out are absent afterwards. Only present fields are rendered, in field
/// order.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct DeviceManagement {
    pub device_id: Option<String>,
    pub generation_id: Option<String>,
    pub etag: Option<String>,
    pub status: Option<DeviceStatus>,
    pub status_reason: Option<String>,
    pub status_updated_time: Option<String>,
    pub connection_state: Option<ConnectionState>,
    pub connection_state_updated_time: Option<String>,
    pub last_activity_time: Option<String>,
}

impl DeviceManagement {
    /// Build a record from the management fields of a document.
    pub fn from_fields(fields: PropertyMap) -> Result<Self, TwinError> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| TwinError::StructuralShape(format!("management fields: {e}")))
    }

    /// Render the present fields as top-level document entries.
    pub fn to_json_map(&self) -> PropertyMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => PropertyMap::new(),
        }
    }
}

/// Validate a device id: non-empty, at most 128 characters, alphanumeric
/// ASCII plus a fixed symbol set.
pub fn validate_device_id(id: &str) -> Result<(), TwinError> {
    if id.is_empty() {
        return Err(TwinError::IllegalArgument("device id is empty".to_string()));
    }
    if id.len() > MAX_DEVICE_ID_LENGTH {
        return Err(TwinError::IllegalArgument(format!(
            "device id is longer than {MAX_DEVICE_ID_LENGTH} characters"
        )));
    }
    if let Some(c) = id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !DEVICE_ID_SYMBOLS.contains(*c))
    {
        return Err(TwinError::IllegalArgument(format!(
            "device id contains illegal character {c:?}"
        )));
    }
    Ok(())
}
