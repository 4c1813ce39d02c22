//! Provenance tags recording where an entity came from.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Provenance tag attached to every entity.
///
/// Sources are opaque to the engine: they are compared, hashed, and
/// grouped over, never interpreted. Cloning is O(1).
#[derive(Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntitySource(Arc<str>);

impl EntitySource {
    /// Creates a source from a tag string.
    #[must_use]
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self(tag.into())
    }

    /// Returns the raw tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntitySource {
    fn from(tag: &str) -> Self {
        Self(tag.into())
    }
}

impl From<String> for EntitySource {
    fn from(tag: String) -> Self {
        Self(tag.into())
    }
}

impl From<Arc<str>> for EntitySource {
    fn from(tag: Arc<str>) -> Self {
        Self(tag)
    }
}

impl fmt::Debug for EntitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntitySource({:?})", &*self.0)
    }
}

impl fmt::Display for EntitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
