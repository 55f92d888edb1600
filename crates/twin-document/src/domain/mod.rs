//! Domain Layer - Pure twin document logic
//!
//! This layer contains:
//! - Key and value validation
//! - Property and tag containers with merge/diff
//! - Per-key metadata
//! - Device management fields
//! - Configuration
//!
//! RULES:
//! - No I/O operations
//! - No clock access: timestamps are passed in by the service layer

pub mod config;
pub mod key;
pub mod management;
pub mod merge;
pub mod metadata;
pub mod properties;
pub mod tags;
pub mod value;

/// Ordered key/value map used for snapshots and changed subsets
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

pub use config::TwinConfig;
pub use key::{validate_key, MAX_KEY_LENGTH};
pub use management::{validate_device_id, ConnectionState, DeviceManagement, DeviceStatus};
pub use metadata::PropertyMetadata;
pub use properties::{PropertyContainer, SectionUpdate};
pub use tags::TagsContainer;
pub use value::{validate_entries, validate_value, MAX_NESTING_DEPTH};
