//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - change notification callbacks
//! - Driven Ports (outbound) - the clock

pub mod inbound;
pub mod outbound;

pub use inbound::{CallbackSlots, ChangeCallback, ChangeKind};
pub use outbound::{format_timestamp, FixedTimeSource, SystemTimeSource, TimeSource};
