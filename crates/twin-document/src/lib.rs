//! # Twin Document
//!
//! In-memory device twin: desired and reported properties, optional tags and
//! per-key metadata, and device management fields, with merge/diff change
//! tracking and canonical JSON shapes.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `validate_key` / `validate_value`: key and value rules
//!   - `PropertyContainer`: desired/reported map with metadata and version
//!   - `TagsContainer`: feature-gated tag map
//!   - `DeviceManagement`: identity, status and connectivity fields
//!   - `TwinConfig`: feature flags
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `ChangeCallback`: Driving port (change notifications)
//!   - `TimeSource`: Driven port (clock for metadata stamps)
//!
//! - **Codec Layer** (`codec/`): JSON shape parsing and rendering
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `TwinDocument`: the root aggregate
//!
//! ## Invariants
//!
//! - A failed call leaves the document unchanged.
//! - Callbacks only ever see non-empty changed subsets, after commit.
//! - `$metadata` and `$version` never appear in snapshots or changed subsets.
//!
//! ## Usage Example
//!
//! ```ignore
//! use twin_document::{ChangeKind, TwinConfig, TwinDocument};
//! use serde_json::json;
//!
//! let mut twin = TwinDocument::with_config(TwinConfig::default().with_tags());
//! twin.set_callback(ChangeKind::Desired, |changed| println!("desired: {changed:?}"));
//!
//! twin.apply_full_document(r#"{"properties":{"desired":{"fan":"on","$version":3}}}"#)?;
//!
//! let reported = json!({"fan": "on"}).as_object().cloned().unwrap_or_default();
//! twin.update_reported(&reported)?;
//!
//! println!("{}", twin.to_text());
//! ```

pub mod codec;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use domain::{
    validate_device_id, validate_entries, validate_key, validate_value, ConnectionState,
    DeviceManagement, DeviceStatus, PropertyContainer, PropertyMap, PropertyMetadata,
    TagsContainer, TwinConfig, MAX_KEY_LENGTH, MAX_NESTING_DEPTH,
};
pub use error::{Feature, KeyViolation, TwinError, ValueViolation};
pub use ports::{ChangeCallback, ChangeKind, FixedTimeSource, SystemTimeSource, TimeSource};
pub use service::TwinDocument;
