//! Strata - Typed entity-relationship storage
//!
//! This crate re-exports both layers of the Strata system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: strata_storage    — Schemas, reference tables, snapshots, builders
//! Layer 0: strata_foundation — Core types (Value, EntityId, Error)
//! ```

pub use strata_foundation as foundation;
pub use strata_storage as storage;
