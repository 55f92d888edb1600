//! JSON shape codec
//!
//! Text in: [`shape::parse_document`] turns a document into a validated
//! [`StagedUpdate`]. Text out: [`render`] produces the canonical layout.

pub mod raw;
pub mod render;
pub mod shape;

pub use shape::{parse_document, parse_section_document, ShapeContext, StagedUpdate};
