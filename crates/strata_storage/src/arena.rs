//! Per-kind entity arenas.
//!
//! Each kind owns one growable column of payload records indexed by array
//! id. Removal leaves a permanent tombstone, so an id observed anywhere
//! stays meaningful for the lifetime of the lineage. Cloning an arena is
//! one `Arc` bump per column; writes go through `Arc::make_mut`, cloning
//! only the touched column.

// Array ids are u32; a column can never outgrow them.
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;
use std::sync::Arc;

use strata_foundation::{EntityId, EntityKind, EntitySource};

use crate::payload::Payload;

/// One entity's stored state: payload plus provenance tag.
#[derive(Clone, Debug)]
pub struct Record {
    /// The property bag.
    pub payload: Arc<dyn Payload>,
    /// Provenance tag.
    pub source: EntitySource,
}

impl Record {
    /// Creates a record from a freshly built payload.
    #[must_use]
    pub fn new(payload: Box<dyn Payload>, source: EntitySource) -> Self {
        Self {
            payload: payload.into(),
            source,
        }
    }
}

/// Growable payload column of one kind.
#[derive(Clone, Debug, Default)]
pub struct Column {
    /// Records indexed by array id; `None` is a tombstone.
    slots: Vec<Option<Record>>,
    /// Number of live records.
    live: usize,
}

impl Column {
    /// Appends a record, returning its freshly assigned array id.
    ///
    /// Ids grow monotonically and are never reused.
    pub fn add(&mut self, record: Record) -> u32 {
        let array_id = self.slots.len() as u32;
        self.slots.push(Some(record));
        self.live += 1;
        array_id
    }

    /// Returns the live record at an array id.
    #[must_use]
    pub fn get(&self, array_id: u32) -> Option<&Record> {
        self.slots.get(array_id as usize)?.as_ref()
    }

    /// Swaps the record at a live array id, returning the superseded one.
    ///
    /// Tombstoned and never-assigned ids stay untouched and yield `None`.
    pub fn replace(&mut self, array_id: u32, record: Record) -> Option<Record> {
        let slot = self.slots.get_mut(array_id as usize)?;
        if slot.is_none() {
            return None;
        }
        slot.replace(record)
    }

    /// Removes the record at an array id, tombstoning the id forever.
    pub fn remove(&mut self, array_id: u32) -> Option<Record> {
        let removed = self.slots.get_mut(array_id as usize)?.take();
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Iterates over live records in ascending array id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Record)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|record| (id as u32, record)))
    }
}

/// Per-kind payload columns, shared until first write.
#[derive(Clone, Debug, Default)]
pub struct EntityArena {
    columns: HashMap<EntityKind, Arc<Column>>,
}

impl EntityArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record under a kind, returning the new entity's id.
    pub fn add(&mut self, kind: EntityKind, record: Record) -> EntityId {
        let array_id = self.column_mut(kind).add(record);
        EntityId::new(kind, array_id)
    }

    /// Returns the live record for an id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Record> {
        self.columns.get(&id.kind)?.get(id.array_id)
    }

    /// Checks whether an id addresses a live record.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Swaps the record at a live id, returning the superseded one.
    ///
    /// Dead ids yield `None` without touching the column.
    pub fn replace(&mut self, id: EntityId, record: Record) -> Option<Record> {
        // Replacing nothing must not clone the column.
        if !self.contains(id) {
            return None;
        }
        self.column_mut(id.kind).replace(id.array_id, record)
    }

    /// Removes the record at an id, tombstoning the id forever.
    ///
    /// Dead ids yield `None` without touching the column.
    pub fn remove(&mut self, id: EntityId) -> Option<Record> {
        // Removing nothing must not clone the column.
        if !self.contains(id) {
            return None;
        }
        self.column_mut(id.kind).remove(id.array_id)
    }

    /// Iterates over one kind's live records in ascending id order.
    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = (u32, &Record)> {
        self.columns
            .get(&kind)
            .into_iter()
            .flat_map(|column| column.iter())
    }

    /// Iterates over every live record across all kinds.
    ///
    /// Ascending id order within a kind; kind order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Record)> {
        self.columns.iter().flat_map(|(kind, column)| {
            let kind = *kind;
            column
                .iter()
                .map(move |(array_id, record)| (EntityId::new(kind, array_id), record))
        })
    }

    /// Returns the total number of live records.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.columns.values().map(|column| column.live()).sum()
    }

    fn column_mut(&mut self, kind: EntityKind) -> &mut Column {
        Arc::make_mut(self.columns.entry(kind).or_default())
    }
}
