//! Inbound Ports (Driving Ports)
//!
//! Change notification slots the document calls back into.

use std::fmt;

use crate::domain::PropertyMap;

/// Which section a change notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Desired,
    Reported,
    Tags,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Desired => write!(f, "desired"),
            ChangeKind::Reported => write!(f, "reported"),
            ChangeKind::Tags => write!(f, "tags"),
        }
    }
}

/// Receives a copy of the changed subset after it has been committed.
///
/// Invoked synchronously on the caller's thread; it should return promptly.
pub type ChangeCallback = Box<dyn Fn(PropertyMap) + Send + Sync>;

/// One optional callback per [`ChangeKind`]; setting a slot replaces it.
#[derive(Default)]
pub struct CallbackSlots {
    desired: Option<ChangeCallback>,
    reported: Option<ChangeCallback>,
    tags: Option<ChangeCallback>,
}

impl CallbackSlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, kind: ChangeKind) -> &mut Option<ChangeCallback> {
        match kind {
            ChangeKind::Desired => &mut self.desired,
            ChangeKind::Reported => &mut self.reported,
            ChangeKind::Tags => &mut self.tags,
        }
    }

    fn slot(&self, kind: ChangeKind) -> Option<&ChangeCallback> {
        match kind {
            ChangeKind::Desired => self.desired.as_ref(),
            ChangeKind::Reported => self.reported.as_ref(),
            ChangeKind::Tags => self.tags.as_ref(),
        }
    }

    pub fn set(&mut self, kind: ChangeKind, callback: ChangeCallback) {
        *self.slot_mut(kind) = Some(callback);
    }

    pub fn clear(&mut self, kind: ChangeKind) {
        *self.slot_mut(kind) = None;
    }

    pub fn is_set(&self, kind: ChangeKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Deliver `changed` to the slot for `kind`.
    ///
    /// Empty subsets are never delivered. Returns whether a callback ran.
    pub fn notify(&self, kind: ChangeKind, changed: &PropertyMap) -> bool {
        match self.slot(kind) {
            Some(callback) if !changed.is_empty() => {
                callback(changed.clone());
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for CallbackSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSlots")
            .field("desired", &self.desired.is_some())
            .field("reported", &self.reported.is_some())
            .field("tags", &self.tags.is_some())
            .finish()
    }
}
