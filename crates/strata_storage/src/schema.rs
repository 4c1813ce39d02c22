//! Entity schemas and the registry the store is built against.
//!
//! A schema describes one entity kind: its named value properties, its
//! declared references to other kinds, and a factory producing an empty
//! payload. The registry validates the whole set at registration time so
//! the store never has to re-check it while editing.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use strata_foundation::{EntityKind, Error, PropertyType, Result};

use crate::payload::Payload;
use crate::refs::{ConnectionId, Hardness};

/// Schema of one named value property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySchema {
    /// Property name as read and written on the payload.
    pub name: Arc<str>,
    /// Declared value type.
    pub ty: PropertyType,
}

impl PropertySchema {
    /// Creates a property schema.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Which side of a one-to-many relation the declaring kind is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// The declaring kind is the parent; the property holds child ids.
    OneToMany,
    /// The declaring kind is the child; the property holds one parent id.
    ManyToOne,
}

/// Schema of one named reference property.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceSchema {
    /// Property name as read and written on the payload.
    pub name: Arc<str>,
    /// The entity kind on the other end of the relation.
    pub target: EntityKind,
    /// Which side of the relation the declaring kind is on.
    pub cardinality: Cardinality,
    /// Cascade behavior on parent removal.
    pub hardness: Hardness,
}

impl ReferenceSchema {
    /// Declares a children property: the declaring kind parents `target`.
    #[must_use]
    pub fn children(name: impl Into<Arc<str>>, target: EntityKind, hardness: Hardness) -> Self {
        Self {
            name: name.into(),
            target,
            cardinality: Cardinality::OneToMany,
            hardness,
        }
    }

    /// Declares a parent property: the declaring kind is a child of `target`.
    #[must_use]
    pub fn parent(name: impl Into<Arc<str>>, target: EntityKind, hardness: Hardness) -> Self {
        Self {
            name: name.into(),
            target,
            cardinality: Cardinality::ManyToOne,
            hardness,
        }
    }

    /// Resolves the connection this property writes to, given the kind
    /// declaring it.
    #[must_use]
    pub fn connection(&self, declaring: EntityKind) -> ConnectionId {
        match self.cardinality {
            Cardinality::OneToMany => ConnectionId::new(declaring, self.target, self.hardness),
            Cardinality::ManyToOne => ConnectionId::new(self.target, declaring, self.hardness),
        }
    }
}

/// Produces an empty payload instance for a kind.
pub type PayloadFactory = fn() -> Box<dyn Payload>;

/// Schema of one entity kind.
#[derive(Clone)]
pub struct EntitySchema {
    /// The kind tag this schema describes.
    pub kind: EntityKind,
    /// Kind name used in messages.
    pub name: Arc<str>,
    /// Declared value properties.
    pub properties: Vec<PropertySchema>,
    /// Declared reference properties.
    pub references: Vec<ReferenceSchema>,
    /// Produces an empty payload instance.
    pub factory: PayloadFactory,
}

impl EntitySchema {
    /// Creates a schema with no declared properties.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<Arc<str>>, factory: PayloadFactory) -> Self {
        Self {
            kind,
            name: name.into(),
            properties: Vec::new(),
            references: Vec::new(),
            factory,
        }
    }

    /// Adds a value property.
    #[must_use]
    pub fn with_property(mut self, property: PropertySchema) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a reference property.
    #[must_use]
    pub fn with_reference(mut self, reference: ReferenceSchema) -> Self {
        self.references.push(reference);
        self
    }

    /// Returns the value property schema by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| &*p.name == name)
    }

    /// Returns the reference property schema by name.
    #[must_use]
    pub fn reference(&self, name: &str) -> Option<&ReferenceSchema> {
        self.references.iter().find(|r| &*r.name == name)
    }

    /// Creates an empty payload for this kind.
    #[must_use]
    pub fn make_payload(&self) -> Box<dyn Payload> {
        (self.factory)()
    }
}

impl fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("references", &self.references)
            .finish_non_exhaustive()
    }
}

/// Validated registry of entity schemas.
///
/// Registration rejects duplicate kinds, kind pairs declared with differing
/// hardness, and hard-reference cycles. Cascade removal relies on the hard
/// graph being acyclic; rejecting cycles here keeps it terminating.
#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    schemas: HashMap<EntityKind, Arc<EntitySchema>>,
    /// Hardness agreed for each declared kind pair.
    declared: HashMap<(EntityKind, EntityKind), Hardness>,
}

impl SchemaSet {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is already registered, if a reference
    /// declares a kind pair an earlier declaration gave a different
    /// hardness, or if the registration would close a hard-reference cycle.
    pub fn register(&mut self, schema: EntitySchema) -> Result<()> {
        if self.schemas.contains_key(&schema.kind) {
            return Err(Error::kind_already_registered(schema.kind));
        }

        // Checks run before any state changes; a rejected schema leaves
        // the registry untouched.
        let mut pending: HashMap<(EntityKind, EntityKind), Hardness> = HashMap::new();
        for reference in &schema.references {
            let connection = reference.connection(schema.kind);
            let pair = (connection.parent(), connection.child());
            let prior = self
                .declared
                .get(&pair)
                .or_else(|| pending.get(&pair))
                .copied();
            if let Some(prior) = prior {
                if prior != connection.hardness() {
                    return Err(Error::connection_conflict(pair.0, pair.1));
                }
            }
            pending.insert(pair, connection.hardness());
        }

        if let Some(kind) = self.find_hard_cycle(&pending) {
            return Err(Error::hard_reference_cycle(kind));
        }

        self.declared.extend(pending);
        self.schemas.insert(schema.kind, Arc::new(schema));
        Ok(())
    }

    /// Returns the schema for a kind.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<&Arc<EntitySchema>> {
        self.schemas.get(&kind)
    }

    /// Returns the schema for a kind, failing if none is registered.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKind` if no schema is registered for `kind`.
    pub fn require(&self, kind: EntityKind) -> Result<&Arc<EntitySchema>> {
        self.schemas.get(&kind).ok_or_else(|| Error::unknown_kind(kind))
    }

    /// Iterates over every registered schema.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntitySchema>> {
        self.schemas.values()
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Looks for a cycle in the hard-reference graph formed by the already
    /// declared pairs plus `pending`. Returns a kind on the found cycle.
    fn find_hard_cycle(
        &self,
        pending: &HashMap<(EntityKind, EntityKind), Hardness>,
    ) -> Option<EntityKind> {
        let mut edges: HashMap<EntityKind, Vec<EntityKind>> = HashMap::new();
        for ((parent, child), hardness) in self.declared.iter().chain(pending) {
            if hardness.is_hard() {
                edges.entry(*parent).or_default().push(*child);
            }
        }

        let mut active = HashSet::new();
        let mut done = HashSet::new();
        let starts: Vec<EntityKind> = edges.keys().copied().collect();
        for start in starts {
            if let Some(found) = walk(start, &edges, &mut active, &mut done) {
                return Some(found);
            }
        }
        None
    }
}

/// Depth-first search over hard edges; reports the kind at which a cycle
/// closes.
fn walk(
    kind: EntityKind,
    edges: &HashMap<EntityKind, Vec<EntityKind>>,
    active: &mut HashSet<EntityKind>,
    done: &mut HashSet<EntityKind>,
) -> Option<EntityKind> {
    if done.contains(&kind) {
        return None;
    }
    if !active.insert(kind) {
        // Revisited while still on the stack.
        return Some(kind);
    }
    if let Some(children) = edges.get(&kind) {
        for child in children {
            if let Some(found) = walk(*child, edges, active, done) {
                return Some(found);
            }
        }
    }
    active.remove(&kind);
    done.insert(kind);
    None
}
