//! Service Layer
//!
//! `TwinDocument` orchestrates the domain containers, the codec and the
//! ports.

pub mod twin_document;

pub use twin_document::TwinDocument;
