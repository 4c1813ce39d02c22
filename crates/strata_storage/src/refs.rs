//! Reference tables keyed by connection descriptor.
//!
//! A connection names one one-to-many relation between a parent kind and a
//! child kind. The table keeps one bidirectional multimap per connection.
//! The mutable variant clones a connection's multimap on first edit and
//! keeps sharing every untouched one with the base table it was derived
//! from, so the cost of an edit is bounded by the touched relation.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use strata_foundation::EntityKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bimap::{IntBimap, IntSeq, MutableIntBimap};

/// Cascade behavior of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Hardness {
    /// Removing the parent removes its children.
    Hard,
    /// Removing the parent only detaches its children.
    Soft,
}

impl Hardness {
    /// Returns true for [`Hardness::Hard`].
    #[must_use]
    pub const fn is_hard(self) -> bool {
        matches!(self, Self::Hard)
    }
}

/// Identifies a one-to-many relation between two entity kinds.
///
/// Equality and hashing cover only the kind pair. Hardness rides along as
/// metadata; the schema registry rejects two declarations of the same pair
/// with differing hardness, so two equal descriptors always carry the same
/// flag once a schema set is registered.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectionId {
    parent: EntityKind,
    child: EntityKind,
    hardness: Hardness,
}

impl ConnectionId {
    /// Creates a connection descriptor.
    #[must_use]
    pub const fn new(parent: EntityKind, child: EntityKind, hardness: Hardness) -> Self {
        Self {
            parent,
            child,
            hardness,
        }
    }

    /// The parent side of the relation.
    #[must_use]
    pub const fn parent(self) -> EntityKind {
        self.parent
    }

    /// The child side of the relation.
    #[must_use]
    pub const fn child(self) -> EntityKind {
        self.child
    }

    /// The cascade behavior of the relation.
    #[must_use]
    pub const fn hardness(self) -> Hardness {
        self.hardness
    }

    /// Returns true if removing the parent cascades to the children.
    #[must_use]
    pub const fn is_hard(self) -> bool {
        self.hardness.is_hard()
    }
}

impl PartialEq for ConnectionId {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.child == other.child
    }
}

impl Eq for ConnectionId {}

impl Hash for ConnectionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.child.hash(state);
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = match self.hardness {
            Hardness::Hard => "hard",
            Hardness::Soft => "soft",
        };
        write!(f, "Connection({:?} -> {:?}, {flag})", self.parent, self.child)
    }
}

/// Immutable reference table: one frozen multimap per connection.
///
/// Shared freely between snapshots and never mutated after construction.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefsTable {
    connections: HashMap<ConnectionId, IntBimap>,
}

impl RefsTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the frozen multimap for a connection, if any edge was ever
    /// recorded under it.
    #[must_use]
    pub fn bimap(&self, connection: ConnectionId) -> Option<&IntBimap> {
        self.connections.get(&connection)
    }

    /// Returns the children of a parent under one connection.
    #[must_use]
    pub fn children_for(&self, connection: ConnectionId, parent_id: u32) -> IntSeq {
        self.connections
            .get(&connection)
            .map_or_else(IntSeq::new, |map| map.keys_for(parent_id))
    }

    /// Returns the parent of a child under one connection.
    #[must_use]
    pub fn parent_for(&self, connection: ConnectionId, child_id: u32) -> Option<u32> {
        self.connections.get(&connection)?.get(child_id)
    }

    /// Collects, per connection rooted at `parent_kind`, the children of one
    /// parent. Connections without children are skipped.
    #[must_use]
    pub fn children(&self, parent_kind: EntityKind, parent_id: u32) -> HashMap<ConnectionId, IntSeq> {
        let mut found = HashMap::new();
        for (connection, map) in &self.connections {
            if connection.parent() != parent_kind {
                continue;
            }
            let children = map.keys_for(parent_id);
            if !children.is_empty() {
                found.insert(*connection, children);
            }
        }
        found
    }

    /// Collects, per connection targeting `child_kind`, the parent of one
    /// child. Connections where the child is detached are skipped.
    #[must_use]
    pub fn parents(&self, child_kind: EntityKind, child_id: u32) -> HashMap<ConnectionId, u32> {
        let mut found = HashMap::new();
        for (connection, map) in &self.connections {
            if connection.child() != child_kind {
                continue;
            }
            if let Some(parent) = map.get(child_id) {
                found.insert(*connection, parent);
            }
        }
        found
    }

    /// Collects the hard children of one parent, grouped by child kind.
    ///
    /// Drives cascading removal. At most one connection exists per kind
    /// pair, so child kinds never collide.
    #[must_use]
    pub fn hard_children_of(&self, parent_kind: EntityKind, parent_id: u32) -> HashMap<EntityKind, IntSeq> {
        let mut found = HashMap::new();
        for (connection, map) in &self.connections {
            if !connection.is_hard() || connection.parent() != parent_kind {
                continue;
            }
            let children = map.keys_for(parent_id);
            if !children.is_empty() {
                found.insert(connection.child(), children);
            }
        }
        found
    }
}

/// Read-only view over either representation of a connection's multimap.
enum BimapRef<'a> {
    Shared(&'a IntBimap),
    Owned(&'a MutableIntBimap),
}

impl BimapRef<'_> {
    fn get(&self, key: u32) -> Option<u32> {
        match self {
            Self::Shared(map) => map.get(key),
            Self::Owned(map) => map.get(key),
        }
    }

    fn keys_for(&self, value: u32) -> IntSeq {
        match self {
            Self::Shared(map) => map.keys_for(value),
            Self::Owned(map) => map.keys_for(value),
        }
    }
}

/// Mutable reference table with copy-on-write at connection granularity.
///
/// Derived from a [`RefsTable`], every connection starts out shared with
/// the base. The first edit touching a connection moves it into the owned
/// set, cloning only that connection's multimap. A connection lives in
/// exactly one of the two sets.
#[derive(Debug, Default)]
pub struct MutableRefsTable {
    /// Connections still aliasing the base table's frozen multimaps.
    shared: HashMap<ConnectionId, IntBimap>,
    /// Connections cloned for editing, exclusively owned.
    owned: HashMap<ConnectionId, MutableIntBimap>,
}

impl MutableRefsTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a mutable table whose every connection aliases `base`.
    #[must_use]
    pub fn from_table(base: &RefsTable) -> Self {
        Self {
            shared: base.connections.clone(),
            owned: HashMap::new(),
        }
    }

    /// Returns the children of a parent under one connection.
    #[must_use]
    pub fn children_for(&self, connection: ConnectionId, parent_id: u32) -> IntSeq {
        self.lookup(connection)
            .map_or_else(IntSeq::new, |map| map.keys_for(parent_id))
    }

    /// Returns the parent of a child under one connection.
    #[must_use]
    pub fn parent_for(&self, connection: ConnectionId, child_id: u32) -> Option<u32> {
        self.lookup(connection)?.get(child_id)
    }

    /// Collects, per connection rooted at `parent_kind`, the children of one
    /// parent. Connections without children are skipped.
    #[must_use]
    pub fn children(&self, parent_kind: EntityKind, parent_id: u32) -> HashMap<ConnectionId, IntSeq> {
        let mut found = HashMap::new();
        for (connection, map) in self.entries() {
            if connection.parent() != parent_kind {
                continue;
            }
            let children = map.keys_for(parent_id);
            if !children.is_empty() {
                found.insert(connection, children);
            }
        }
        found
    }

    /// Collects, per connection targeting `child_kind`, the parent of one
    /// child. Connections where the child is detached are skipped.
    #[must_use]
    pub fn parents(&self, child_kind: EntityKind, child_id: u32) -> HashMap<ConnectionId, u32> {
        let mut found = HashMap::new();
        for (connection, map) in self.entries() {
            if connection.child() != child_kind {
                continue;
            }
            if let Some(parent) = map.get(child_id) {
                found.insert(connection, parent);
            }
        }
        found
    }

    /// Collects the hard children of one parent, grouped by child kind.
    #[must_use]
    pub fn hard_children_of(&self, parent_kind: EntityKind, parent_id: u32) -> HashMap<EntityKind, IntSeq> {
        let mut found = HashMap::new();
        for (connection, map) in self.entries() {
            if !connection.is_hard() || connection.parent() != parent_kind {
                continue;
            }
            let children = map.keys_for(parent_id);
            if !children.is_empty() {
                found.insert(connection.child(), children);
            }
        }
        found
    }

    /// Drops a child's parent mapping under one connection.
    ///
    /// No-op if the child is already detached.
    pub fn remove_one_to_many(&mut self, connection: ConnectionId, child_id: u32) {
        // Removing nothing must not clone the connection.
        if self.parent_for(connection, child_id).is_none() {
            return;
        }
        self.bimap_mut(connection).remove_key(child_id);
    }

    /// Drops every child mapped to a parent under one connection.
    ///
    /// No-op if the parent has no children there.
    pub fn remove_many_to_one(&mut self, connection: ConnectionId, parent_id: u32) {
        // Removing nothing must not clone the connection.
        if self.children_for(connection, parent_id).is_empty() {
            return;
        }
        self.bimap_mut(connection).remove_value(parent_id);
    }

    /// Replaces a parent's full child set under one connection.
    ///
    /// Every old association is dropped, every new child is attached. A new
    /// child previously owned by another parent is re-pointed here.
    pub fn update_one_to_many<I>(&mut self, connection: ConnectionId, parent_id: u32, children: I)
    where
        I: IntoIterator<Item = u32>,
    {
        let map = self.bimap_mut(connection);
        map.remove_value(parent_id);
        for child_id in children {
            map.put(child_id, parent_id);
        }
    }

    /// Reassigns one child's parent under one connection.
    pub fn update_many_to_one(&mut self, connection: ConnectionId, child_id: u32, parent_id: u32) {
        self.bimap_mut(connection).put(child_id, parent_id);
    }

    /// Produces a frozen table, reusing untouched connections without
    /// copying. The mutable table stays usable afterward.
    #[must_use]
    pub fn freeze(&self) -> RefsTable {
        let mut connections = self.shared.clone();
        for (connection, map) in &self.owned {
            connections.insert(*connection, map.to_immutable());
        }
        RefsTable { connections }
    }

    fn lookup(&self, connection: ConnectionId) -> Option<BimapRef<'_>> {
        if let Some(map) = self.owned.get(&connection) {
            return Some(BimapRef::Owned(map));
        }
        self.shared.get(&connection).map(BimapRef::Shared)
    }

    fn entries(&self) -> impl Iterator<Item = (ConnectionId, BimapRef<'_>)> {
        let owned = self
            .owned
            .iter()
            .map(|(connection, map)| (*connection, BimapRef::Owned(map)));
        let shared = self
            .shared
            .iter()
            .map(|(connection, map)| (*connection, BimapRef::Shared(map)));
        owned.chain(shared)
    }

    fn bimap_mut(&mut self, connection: ConnectionId) -> &mut MutableIntBimap {
        if let Some(frozen) = self.shared.remove(&connection) {
            self.owned.insert(connection, frozen.to_mutable());
        }
        self.owned.entry(connection).or_default()
    }
}
