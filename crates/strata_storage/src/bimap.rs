//! Bidirectional integer multimap backing the reference table.
//!
//! Each key maps to at most one value, while a reverse index answers the
//! opposite question (every key mapped to a value) without scanning. Both
//! directions are updated together on every mutation. The reference table
//! stores child array ids as keys and the parent array id as the value.
//!
//! Two representations coexist: [`IntBimap`] is shared and never mutated,
//! [`MutableIntBimap`] is exclusively owned and edited in place. Conversion
//! in either direction is O(1) because both maps are persistent.

use im::{HashMap, Vector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A finite, restartable sequence of array ids.
///
/// Returned by reverse lookups. Cheap to clone and safe to iterate any
/// number of times.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntSeq(Vector<u32>);

impl IntSeq {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of ids in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the sequence holds no ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether an id is present.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    /// Iterates over the ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for IntSeq {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for IntSeq {
    type Item = u32;
    type IntoIter = im::vector::ConsumingIter<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a IntSeq {
    type Item = u32;
    type IntoIter = std::iter::Copied<im::vector::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

/// Immutable bidirectional multimap.
///
/// Shared freely between snapshots and never mutated after construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntBimap {
    /// Forward index: key -> its single value.
    forward: HashMap<u32, u32>,
    /// Reverse index: value -> every key mapped to it.
    reverse: HashMap<u32, Vector<u32>>,
}

impl IntBimap {
    /// Creates an empty bimap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the value a key maps to.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<u32> {
        self.forward.get(&key).copied()
    }

    /// Returns every key currently mapped to a value.
    #[must_use]
    pub fn keys_for(&self, value: u32) -> IntSeq {
        self.reverse
            .get(&value)
            .map_or_else(IntSeq::new, |keys| IntSeq(keys.clone()))
    }

    /// Checks whether a key has a mapping.
    #[must_use]
    pub fn contains_key(&self, key: u32) -> bool {
        self.forward.contains_key(&key)
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns true if the bimap holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterates over all key-value pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.forward.iter().map(|(key, value)| (*key, *value))
    }

    /// Checks whether two bimaps share their backing structure.
    ///
    /// False negatives are possible for equal contents built separately;
    /// true means the two are the same data in memory.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.forward.ptr_eq(&other.forward) && self.reverse.ptr_eq(&other.reverse)
    }

    /// Produces an editable copy in O(1).
    ///
    /// Edits to the copy never reach this bimap.
    #[must_use]
    pub fn to_mutable(&self) -> MutableIntBimap {
        MutableIntBimap {
            forward: self.forward.clone(),
            reverse: self.reverse.clone(),
        }
    }
}

/// Mutable bidirectional multimap, exclusively owned and edited in place.
#[derive(Clone, Debug, Default)]
pub struct MutableIntBimap {
    /// Forward index: key -> its single value.
    forward: HashMap<u32, u32>,
    /// Reverse index: value -> every key mapped to it.
    reverse: HashMap<u32, Vector<u32>>,
}

impl MutableIntBimap {
    /// Creates an empty bimap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the value a key maps to.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<u32> {
        self.forward.get(&key).copied()
    }

    /// Returns every key currently mapped to a value.
    #[must_use]
    pub fn keys_for(&self, value: u32) -> IntSeq {
        self.reverse
            .get(&value)
            .map_or_else(IntSeq::new, |keys| IntSeq(keys.clone()))
    }

    /// Checks whether a key has a mapping.
    #[must_use]
    pub fn contains_key(&self, key: u32) -> bool {
        self.forward.contains_key(&key)
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns true if the bimap holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterates over all key-value pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.forward.iter().map(|(key, value)| (*key, *value))
    }

    /// Maps a key to a value, overwriting any prior mapping for the key.
    pub fn put(&mut self, key: u32, value: u32) {
        match self.forward.insert(key, value) {
            Some(old) if old == value => {}
            Some(old) => {
                // The old value must stop claiming this key.
                self.drop_reverse(old, key);
                self.push_reverse(value, key);
            }
            None => self.push_reverse(value, key),
        }
    }

    /// Removes a key's mapping, returning the value it pointed to.
    ///
    /// No-op on an absent key.
    pub fn remove_key(&mut self, key: u32) -> Option<u32> {
        let value = self.forward.remove(&key)?;
        self.drop_reverse(value, key);
        Some(value)
    }

    /// Removes every key currently mapped to a value, returning them.
    ///
    /// No-op on an absent value.
    pub fn remove_value(&mut self, value: u32) -> IntSeq {
        let Some(keys) = self.reverse.remove(&value) else {
            return IntSeq::new();
        };
        for key in &keys {
            self.forward.remove(key);
        }
        IntSeq(keys)
    }

    /// Produces a frozen copy in O(1).
    ///
    /// Later edits to this bimap never reach the copy.
    #[must_use]
    pub fn to_immutable(&self) -> IntBimap {
        IntBimap {
            forward: self.forward.clone(),
            reverse: self.reverse.clone(),
        }
    }

    fn push_reverse(&mut self, value: u32, key: u32) {
        if let Some(keys) = self.reverse.get_mut(&value) {
            keys.push_back(key);
        } else {
            self.reverse.insert(value, Vector::unit(key));
        }
    }

    fn drop_reverse(&mut self, value: u32, key: u32) {
        let now_empty = match self.reverse.get_mut(&value) {
            Some(keys) => {
                keys.retain(|k| *k != key);
                keys.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.reverse.remove(&value);
        }
    }
}
