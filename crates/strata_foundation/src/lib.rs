//! Core types, values, and persistent collections for Strata.
//!
//! This crate provides:
//! - [`EntityId`] - Typed entity identifiers (kind tag + array index)
//! - [`EntitySource`] - Opaque provenance tags
//! - [`Value`] - The property value type for entity payloads
//! - [`PropertyType`] - Type descriptors for schema validation
//! - [`Error`] - Categorized error types
//! - Persistent collections ([`StVec`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod entity;
pub mod error;
pub mod source;
pub mod types;
pub mod value;

pub use collections::StVec;
pub use entity::{EntityId, EntityKind};
pub use error::{Error, ErrorKind, Result};
pub use source::EntitySource;
pub use types::PropertyType;
pub use value::Value;
