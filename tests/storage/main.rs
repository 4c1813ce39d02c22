//! Integration tests for Layer 1: Storage
//!
//! Tests for entity lifecycle, typed references, snapshots, and source
//! grouping.

mod sources;
mod support;
