//! Entity storage, typed references, and snapshot state for Strata.
//!
//! This crate provides:
//! - [`IntBimap`] - Bidirectional child-to-parent index maps
//! - [`RefsTable`] - Per-connection reference tables with copy-on-write
//! - [`SchemaSet`] - Validated registry of entity kind schemas
//! - [`EntityArena`] - Per-kind payload columns with tombstoned ids
//! - [`Snapshot`] / [`Builder`] - Immutable state and its copy-on-write editor

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod bimap;
pub mod payload;
pub mod refs;
pub mod schema;
pub mod store;


pub use arena::{Column, EntityArena, Record};
pub use bimap::{IntBimap, IntSeq, MutableIntBimap};
pub use payload::Payload;
pub use refs::{ConnectionId, Hardness, MutableRefsTable, RefsTable};
pub use schema::{
    Cardinality, EntitySchema, PayloadFactory, PropertySchema, ReferenceSchema, SchemaSet,
};
pub use store::{Builder, EntityView, Snapshot};
