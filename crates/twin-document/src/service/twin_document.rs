//! Twin Document Service
//!
//! Root aggregate: two property sections, tags, management fields, feature
//! flags and the change callbacks. Every mutating call validates everything
//! first, commits, and only then notifies.

use std::fmt;
use std::sync::Arc;

use twin_telemetry::log_twin_event;

use crate::codec::render::{assemble, render_diff, render_section, render_tags};
use crate::codec::shape::{DESIRED_TAG, REPORTED_TAG};
use crate::codec::{parse_document, parse_section_document, ShapeContext, StagedUpdate};
use crate::domain::management::validate_device_id;
use crate::domain::{
    validate_entries, DeviceManagement, DeviceStatus, PropertyContainer, PropertyMap,
    PropertyMetadata, TagsContainer, TwinConfig,
};
use crate::error::{Feature, TwinError};
use crate::ports::{CallbackSlots, ChangeCallback, ChangeKind, SystemTimeSource, TimeSource};

/// The two property sections a caller can address directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Desired,
    Reported,
}

impl Section {
    fn kind(self) -> ChangeKind {
        match self {
            Section::Desired => ChangeKind::Desired,
            Section::Reported => ChangeKind::Reported,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Section::Desired => DESIRED_TAG,
            Section::Reported => REPORTED_TAG,
        }
    }
}

/// A device twin held in memory.
///
/// Not internally synchronized: mutation takes `&mut self`, so sharing one
/// document between threads needs an outer lock.
pub struct TwinDocument {
    desired: PropertyContainer,
    reported: PropertyContainer,
    tags: TagsContainer,
    management: DeviceManagement,
    callbacks: CallbackSlots,
    time_source: Arc<dyn TimeSource>,
}

impl Default for TwinDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl TwinDocument {
    /// Create an empty document with no optional features.
    pub fn new() -> Self {
        Self::with_config(TwinConfig::default())
    }

    pub fn with_config(config: TwinConfig) -> Self {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Create with an injected clock (for deterministic metadata stamps).
    pub fn with_time_source(config: TwinConfig, time_source: Arc<dyn TimeSource>) -> Self {
        let mut document = Self {
            desired: PropertyContainer::new(),
            reported: PropertyContainer::new(),
            tags: TagsContainer::new(),
            management: DeviceManagement::default(),
            callbacks: CallbackSlots::new(),
            time_source,
        };
        if config.tags_enabled {
            document.enable_tags();
        }
        if config.metadata_enabled {
            document.enable_metadata();
        }
        document
    }

    // =========================================================================
    // FEATURES AND CALLBACKS
    // =========================================================================

    pub fn enable_tags(&mut self) {
        self.tags.enable();
    }

    pub fn enable_metadata(&mut self) {
        self.desired.enable_metadata();
        self.reported.enable_metadata();
    }

    pub fn tags_enabled(&self) -> bool {
        self.tags.is_enabled()
    }

    pub fn metadata_enabled(&self) -> bool {
        self.desired.metadata_enabled()
    }

    /// Register the callback for `kind`, replacing any previous one.
    pub fn set_callback<F>(&mut self, kind: ChangeKind, callback: F)
    where
        F: Fn(PropertyMap) + Send + Sync + 'static,
    {
        let callback: ChangeCallback = Box::new(callback);
        self.callbacks.set(kind, callback);
    }

    pub fn clear_callback(&mut self, kind: ChangeKind) {
        self.callbacks.clear(kind);
    }

    fn notify(&self, kind: ChangeKind, changed: &PropertyMap) {
        if self.callbacks.notify(kind, changed) {
            log_twin_event!(trace, kind, "[twin] callback dispatched", keys = changed.len());
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut PropertyContainer {
        match section {
            Section::Desired => &mut self.desired,
            Section::Reported => &mut self.reported,
        }
    }

    // =========================================================================
    // MAP UPDATES
    // =========================================================================

    /// Merge into `desired`; returns the changed subset or `None`.
    pub fn update_desired(
        &mut self,
        properties: &PropertyMap,
    ) -> Result<Option<PropertyMap>, TwinError> {
        self.update_section(Section::Desired, properties)
    }

    /// Merge into `reported`; returns the changed subset or `None`.
    pub fn update_reported(
        &mut self,
        properties: &PropertyMap,
    ) -> Result<Option<PropertyMap>, TwinError> {
        self.update_section(Section::Reported, properties)
    }

    fn update_section(
        &mut self,
        section: Section,
        properties: &PropertyMap,
    ) -> Result<Option<PropertyMap>, TwinError> {
        let now = self.time_source.now();
        let changed = self.section_mut(section).merge_update(properties, &now)?;
        let kind = section.kind();

        match &changed {
            Some(changed) => {
                log_twin_event!(debug, kind, "[twin] merged update", keys = changed.len());
                self.notify(kind, changed);
            }
            None => log_twin_event!(trace, kind, "[twin] update changed nothing"),
        }
        Ok(changed)
    }

    /// Replace `desired` entirely. No callback is fired.
    pub fn reset_desired(&mut self, properties: &PropertyMap) -> Result<PropertyMap, TwinError> {
        self.reset_section(Section::Desired, properties)
    }

    /// Replace `reported` entirely. No callback is fired.
    pub fn reset_reported(&mut self, properties: &PropertyMap) -> Result<PropertyMap, TwinError> {
        self.reset_section(Section::Reported, properties)
    }

    fn reset_section(
        &mut self,
        section: Section,
        properties: &PropertyMap,
    ) -> Result<PropertyMap, TwinError> {
        let now = self.time_source.now();
        let content = self.section_mut(section).reset(properties, &now)?;
        log_twin_event!(debug, section.kind(), "[twin] section reset", keys = content.len());
        Ok(content)
    }

    pub fn update_tags(&mut self, tags: &PropertyMap) -> Result<Option<PropertyMap>, TwinError> {
        let changed = self.tags.merge_update(tags)?;
        if let Some(changed) = &changed {
            log_twin_event!(debug, ChangeKind::Tags, "[twin] merged update", keys = changed.len());
            self.notify(ChangeKind::Tags, changed);
        }
        Ok(changed)
    }

    /// Replace all tags. The tags callback receives the new content when it
    /// is non-empty.
    pub fn reset_tags(&mut self, tags: &PropertyMap) -> Result<PropertyMap, TwinError> {
        let content = self.tags.reset(tags)?;
        log_twin_event!(debug, ChangeKind::Tags, "[twin] section reset", keys = content.len());
        self.notify(ChangeKind::Tags, &content);
        Ok(content)
    }

    /// Merge several maps in one step.
    ///
    /// All given maps are validated before any is applied. Returns `None`
    /// when nothing changed, otherwise a document holding only the changes.
    pub fn update_twin(
        &mut self,
        desired: Option<&PropertyMap>,
        reported: Option<&PropertyMap>,
        tags: Option<&PropertyMap>,
    ) -> Result<Option<String>, TwinError> {
        if desired.is_none() && reported.is_none() && tags.is_none() {
            return Err(TwinError::IllegalArgument(
                "no desired, reported or tags map to update".to_string(),
            ));
        }
        if tags.is_some() && !self.tags_enabled() {
            return Err(TwinError::FeatureDisabled(Feature::Tags));
        }
        for map in [desired, reported, tags].into_iter().flatten() {
            validate_entries(map)?;
        }

        let now = self.time_source.now();
        let desired_changed = match desired {
            Some(map) => self.desired.merge_update(map, &now)?,
            None => None,
        };
        let reported_changed = match reported {
            Some(map) => self.reported.merge_update(map, &now)?,
            None => None,
        };
        let tags_changed = match tags {
            Some(map) => self.tags.merge_update(map)?,
            None => None,
        };

        if desired_changed.is_none() && reported_changed.is_none() && tags_changed.is_none() {
            tracing::trace!("[twin] combined update changed nothing");
            return Ok(None);
        }

        let desired_changed = desired_changed.unwrap_or_default();
        let reported_changed = reported_changed.unwrap_or_default();
        let tags_changed = tags_changed.unwrap_or_default();
        tracing::debug!(
            desired = desired_changed.len(),
            reported = reported_changed.len(),
            tags = tags_changed.len(),
            "[twin] combined update"
        );

        self.notify(ChangeKind::Desired, &desired_changed);
        self.notify(ChangeKind::Reported, &reported_changed);
        self.notify(ChangeKind::Tags, &tags_changed);

        let tags_section = self.tags_enabled().then_some(tags_changed);
        Ok(Some(render_diff(
            &self.management,
            tags_section,
            desired_changed,
            reported_changed,
        )))
    }

    // =========================================================================
    // DEVICE MANAGEMENT
    // =========================================================================

    /// Set the device id and lifecycle status.
    ///
    /// A status change needs a reason and stamps `statusUpdatedTime`. Returns
    /// the full document when anything changed, otherwise `None`.
    pub fn update_device_management(
        &mut self,
        device_id: &str,
        status: Option<DeviceStatus>,
        status_reason: Option<&str>,
    ) -> Result<Option<String>, TwinError> {
        validate_device_id(device_id)?;

        let status_changed = status != self.management.status;
        if status_changed && status_reason.is_none() {
            return Err(TwinError::IllegalArgument(
                "status change requires a status reason".to_string(),
            ));
        }
        let id_changed = self.management.device_id.as_deref() != Some(device_id);

        if status_changed {
            self.management.status = status;
            self.management.status_reason = status_reason.map(str::to_string);
            self.management.status_updated_time = Some(self.time_source.now());
        }
        if id_changed {
            self.management.device_id = Some(device_id.to_string());
        }

        if !status_changed && !id_changed {
            return Ok(None);
        }
        tracing::debug!(
            device_id,
            status = status.map(|s| s.as_str()),
            "[twin] device management updated"
        );
        Ok(Some(self.to_text()))
    }

    pub fn set_device_id(&mut self, device_id: &str) -> Result<(), TwinError> {
        validate_device_id(device_id)?;
        self.management.device_id = Some(device_id.to_string());
        Ok(())
    }

    pub fn set_etag(&mut self, etag: &str) -> Result<(), TwinError> {
        if etag.is_empty() {
            return Err(TwinError::IllegalArgument("etag is empty".to_string()));
        }
        self.management.etag = Some(etag.to_string());
        Ok(())
    }

    pub fn management(&self) -> &DeviceManagement {
        &self.management
    }

    // =========================================================================
    // TEXT IN / TEXT OUT
    // =========================================================================

    /// Apply a full-twin or properties-only JSON document.
    ///
    /// The whole document is validated before anything is committed.
    pub fn apply_full_document(&mut self, text: &str) -> Result<(), TwinError> {
        ensure_text(text)?;

        let staged = match parse_document(text, self.shape_context()) {
            Ok(staged) => staged,
            Err(err) => {
                tracing::debug!(error = %err, "[twin] rejected document");
                return Err(err);
            }
        };

        self.commit(staged)
    }

    fn shape_context(&self) -> ShapeContext {
        ShapeContext {
            tags_enabled: self.tags_enabled(),
            metadata_enabled: self.metadata_enabled(),
        }
    }

    fn commit(&mut self, staged: StagedUpdate) -> Result<(), TwinError> {
        let now = self.time_source.now();

        if let Some(management) = staged.management {
            self.management = management;
        }
        let tags_changed = match staged.tags {
            Some(tags) => self.tags.apply_parsed(tags)?,
            None => PropertyMap::new(),
        };
        let desired_changed = staged
            .desired
            .map(|section| self.desired.apply_section(section, &now))
            .unwrap_or_default();
        let reported_changed = staged
            .reported
            .map(|section| self.reported.apply_section(section, &now))
            .unwrap_or_default();

        tracing::debug!(
            desired = desired_changed.len(),
            reported = reported_changed.len(),
            tags = tags_changed.len(),
            "[twin] applied document"
        );

        self.notify(ChangeKind::Desired, &desired_changed);
        self.notify(ChangeKind::Reported, &reported_changed);
        self.notify(ChangeKind::Tags, &tags_changed);
        Ok(())
    }

    /// Apply a single `desired` section document; returns the changed subset.
    pub fn apply_desired_document(&mut self, text: &str) -> Result<PropertyMap, TwinError> {
        self.apply_section_document(Section::Desired, text)
    }

    /// Apply a single `reported` section document; returns the changed subset.
    pub fn apply_reported_document(&mut self, text: &str) -> Result<PropertyMap, TwinError> {
        self.apply_section_document(Section::Reported, text)
    }

    fn apply_section_document(
        &mut self,
        section: Section,
        text: &str,
    ) -> Result<PropertyMap, TwinError> {
        ensure_text(text)?;
        let update = parse_section_document(text, section.tag(), self.shape_context())?;

        let now = self.time_source.now();
        let changed = self.section_mut(section).apply_section(update, &now);
        let kind = section.kind();
        log_twin_event!(debug, kind, "[twin] applied section", keys = changed.len());
        self.notify(kind, &changed);
        Ok(changed)
    }

    /// Render the current state in canonical form.
    pub fn to_text(&self) -> String {
        let tags = self
            .tags
            .snapshot()
            .ok()
            .map(|snapshot| render_tags(snapshot.as_ref()));
        assemble(
            &self.management,
            tags,
            render_section(&self.desired),
            render_section(&self.reported),
        )
        .to_string()
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Desired entries; `None` if the section was never mutated.
    pub fn desired_map(&self) -> Option<PropertyMap> {
        self.desired.snapshot()
    }

    /// Reported entries; `None` if the section was never mutated.
    pub fn reported_map(&self) -> Option<PropertyMap> {
        self.reported.snapshot()
    }

    pub fn tags_map(&self) -> Result<Option<PropertyMap>, TwinError> {
        self.tags.snapshot()
    }

    pub fn desired_version(&self) -> Option<i64> {
        self.desired.version()
    }

    pub fn reported_version(&self) -> Option<i64> {
        self.reported.version()
    }

    pub fn desired_metadata(&self, key: &str) -> Result<Option<&PropertyMetadata>, TwinError> {
        self.ensure_metadata()?;
        Ok(self.desired.metadata(key))
    }

    pub fn reported_metadata(&self, key: &str) -> Result<Option<&PropertyMetadata>, TwinError> {
        self.ensure_metadata()?;
        Ok(self.reported.metadata(key))
    }

    fn ensure_metadata(&self) -> Result<(), TwinError> {
        if self.metadata_enabled() {
            Ok(())
        } else {
            Err(TwinError::FeatureDisabled(Feature::Metadata))
        }
    }
}

fn ensure_text(text: &str) -> Result<(), TwinError> {
    if text.trim().is_empty() {
        return Err(TwinError::IllegalArgument("document text is empty".to_string()));
    }
    Ok(())
}

impl fmt::Debug for TwinDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwinDocument")
            .field("desired", &self.desired)
            .field("reported", &self.reported)
            .field("tags", &self.tags)
            .field("management", &self.management)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}
