//! Entity identifiers: a type tag plus an index into that type's array.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type tag identifying an entity kind.
///
/// Kinds are assigned by the schema layer; the storage engine only needs
/// them to be cheap to copy, compare, and hash.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityKind(u32);

impl EntityKind {
    /// Creates a kind tag from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this kind.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.0)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity identifier: a kind tag plus an index into that kind's array.
///
/// Array ids are handed out monotonically per kind and are never reused
/// after removal, so an id captured while its entity was live keeps
/// denoting exactly that entity forever. A dangling id resolves to
/// "not found", never to a different entity.
///
/// # Layout
/// - `kind`: which per-kind array the entity lives in
/// - `array_id`: index into that array
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId {
    /// The entity's kind tag.
    pub kind: EntityKind,
    /// Index into the kind's entity array.
    pub array_id: u32,
}

impl EntityId {
    /// Creates an entity ID from a kind and array index.
    #[must_use]
    pub const fn new(kind: EntityKind, array_id: u32) -> Self {
        Self { kind, array_id }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}:{})", self.kind.index(), self.array_id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{})", self.kind.index(), self.array_id)
    }
}
