//! Snapshots and builders over one entity graph.
//!
//! A [`Snapshot`] is fully immutable and freely shareable across threads.
//! A [`Builder`] layers copy-on-write edits over a base snapshot: payload
//! columns and reference connections stay shared until the first write
//! touches them. `freeze` publishes a new snapshot and leaves the builder
//! usable.
//!
//! Every edit is atomic: it validates first and commits only when nothing
//! can fail anymore, so a rejected call leaves the builder unchanged.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use strata_foundation::{EntityId, EntityKind, EntitySource, Error, PropertyType, Result, Value};

use crate::arena::{EntityArena, Record};
use crate::bimap::IntSeq;
use crate::payload::Payload;
use crate::refs::{ConnectionId, MutableRefsTable, RefsTable};
use crate::schema::{Cardinality, EntitySchema, ReferenceSchema, SchemaSet};

/// Read view of one live entity at one payload version.
///
/// Cheap to clone. The view keeps the payload version it was created
/// with, even if the entity is later modified or removed.
#[derive(Clone)]
pub struct EntityView {
    id: EntityId,
    source: EntitySource,
    payload: Arc<dyn Payload>,
    schema: Arc<EntitySchema>,
}

impl EntityView {
    fn new(id: EntityId, record: &Record, schema: Arc<EntitySchema>) -> Self {
        Self {
            id,
            source: record.source.clone(),
            payload: Arc::clone(&record.payload),
            schema,
        }
    }

    /// The entity's identity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The entity's kind tag.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.id.kind
    }

    /// The provenance tag.
    #[must_use]
    pub fn source(&self) -> &EntitySource {
        &self.source
    }

    /// Reads a named property from this view's payload version.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<Value> {
        self.payload.get(property)
    }

    /// The payload version this view was created with.
    #[must_use]
    pub fn payload(&self) -> &dyn Payload {
        self.payload.as_ref()
    }

    /// The schema of the entity's kind.
    #[must_use]
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Downcasts the payload to its concrete per-kind type.
    #[must_use]
    pub fn downcast<T: Payload>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// Compares payload content property by property, ignoring id and
    /// source.
    ///
    /// Only declared value properties take part; relation truth lives in
    /// the reference table, not in payload fields. Views of different
    /// kinds never compare equal.
    #[must_use]
    pub fn has_equal_properties(&self, other: &EntityView) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        self.schema.properties.iter().all(|property| {
            self.payload.get(&property.name) == other.payload.get(&property.name)
        })
    }
}

impl PartialEq for EntityView {
    /// Structural identity: same kind and array id.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityView {}

impl Hash for EntityView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EntityView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityView")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// Fully immutable storage state.
///
/// Snapshots may be read concurrently from any number of threads without
/// synchronization, indefinitely.
#[derive(Clone, Debug)]
pub struct Snapshot {
    schemas: Arc<SchemaSet>,
    arena: EntityArena,
    refs: RefsTable,
}

impl Snapshot {
    /// The schema set this snapshot was built against.
    #[must_use]
    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// The reference table.
    #[must_use]
    pub fn refs(&self) -> &RefsTable {
        &self.refs
    }

    /// Looks up a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityView> {
        lookup_view(&self.schemas, &self.arena, id)
    }

    /// Checks whether an id addresses a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.arena.contains(id)
    }

    /// Iterates over one kind's live entities in ascending id order.
    ///
    /// The sequence is lazy and restartable: call again for a fresh pass.
    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = EntityView> + '_ {
        kind_views(&self.schemas, &self.arena, kind)
    }

    /// Returns the total number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Groups every live entity whose source satisfies `predicate` by
    /// source, then by kind.
    pub fn entities_by_source<F>(
        &self,
        predicate: F,
    ) -> HashMap<EntitySource, HashMap<EntityKind, Vec<EntityView>>>
    where
        F: Fn(&EntitySource) -> bool,
    {
        group_by_source(&self.schemas, &self.arena, predicate)
    }

    /// Resolves the children of `parent` under one connection.
    ///
    /// `parent` must be of the connection's parent kind.
    ///
    /// # Panics
    ///
    /// Panics if the reference table addresses a dead entity; unreachable
    /// short of a storage bug.
    #[must_use]
    pub fn children(&self, connection: ConnectionId, parent: EntityId) -> Vec<EntityView> {
        let children = self.refs.children_for(connection, parent.array_id);
        resolve_children(&self.schemas, &self.arena, connection, &children)
    }

    /// Resolves the parent of `child` under one connection.
    ///
    /// `child` must be of the connection's child kind.
    ///
    /// # Panics
    ///
    /// Panics if the reference table addresses a dead entity; unreachable
    /// short of a storage bug.
    #[must_use]
    pub fn parent(&self, connection: ConnectionId, child: EntityId) -> Option<EntityView> {
        let parent_id = self.refs.parent_for(connection, child.array_id)?;
        Some(resolve_parent(&self.schemas, &self.arena, connection, parent_id))
    }
}

/// Mutable copy-on-write editor over a base snapshot.
///
/// A builder performs no internal locking; callers serialize access to one
/// builder instance. Deriving a builder never mutates its base snapshot.
#[derive(Debug)]
pub struct Builder {
    schemas: Arc<SchemaSet>,
    arena: EntityArena,
    refs: MutableRefsTable,
}

impl Builder {
    /// Creates an empty builder over a schema set.
    #[must_use]
    pub fn new(schemas: SchemaSet) -> Self {
        Self {
            schemas: Arc::new(schemas),
            arena: EntityArena::new(),
            refs: MutableRefsTable::new(),
        }
    }

    /// Derives a builder sharing every column and connection of `base`
    /// until the first write touches it.
    #[must_use]
    pub fn from_snapshot(base: &Snapshot) -> Self {
        Self {
            schemas: Arc::clone(&base.schemas),
            arena: base.arena.clone(),
            refs: MutableRefsTable::from_table(&base.refs),
        }
    }

    /// The schema set this builder edits against.
    #[must_use]
    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// The in-progress reference table.
    #[must_use]
    pub fn refs(&self) -> &MutableRefsTable {
        &self.refs
    }

    /// Adds an entity of `kind`, building its payload via `init`.
    ///
    /// Allocates the next array id for the kind, records `source`, and
    /// mirrors declared reference properties into the reference table.
    /// Returns a read view of the new entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is not registered, if `init` fails, if
    /// a declared property holds a value of the wrong type, or if a
    /// reference property addresses a dead entity or one of the wrong
    /// kind. Nothing is committed on error.
    pub fn add_entity<F>(
        &mut self,
        kind: EntityKind,
        source: EntitySource,
        init: F,
    ) -> Result<EntityView>
    where
        F: FnOnce(&mut dyn Payload) -> Result<()>,
    {
        let schema = Arc::clone(self.schemas.require(kind)?);
        let mut payload = schema.make_payload();
        init(payload.as_mut())?;

        check_value_properties(&schema, payload.as_ref())?;
        let planned = plan_references(&schema, payload.as_ref())?;
        for (reference, plan) in schema.references.iter().zip(&planned) {
            check_reference_targets(&self.arena, reference, &plan.write)?;
        }

        // Validated; nothing past this point can fail.
        let record = Record::new(payload, source);
        let payload = Arc::clone(&record.payload);
        let source = record.source.clone();
        let id = self.arena.add(kind, record);
        for plan in &planned {
            // An unset reference registers no link and must not touch the
            // connection.
            if plan.write.is_neutral() {
                continue;
            }
            apply_reference_write(&mut self.refs, id.array_id, plan);
        }

        Ok(EntityView {
            id,
            source,
            payload,
            schema,
        })
    }

    /// Replaces the payload of a live entity at the same id.
    ///
    /// The current payload is cloned, `mutate` is applied to the clone,
    /// and the clone is committed. Views and snapshots captured earlier
    /// keep observing the superseded payload. Changed reference properties
    /// are mirrored into the reference table; untouched ones are not
    /// revalidated, so ids left stale by earlier removals never fail an
    /// unrelated edit.
    ///
    /// # Errors
    ///
    /// Returns an error if `kind` differs from the id's kind, if the
    /// entity is not live, if `mutate` fails, or if the mutated payload
    /// fails property or reference validation. Nothing is committed on
    /// error.
    pub fn modify_entity<F>(&mut self, kind: EntityKind, id: EntityId, mutate: F) -> Result<EntityView>
    where
        F: FnOnce(&mut dyn Payload) -> Result<()>,
    {
        if kind != id.kind {
            return Err(Error::kind_mismatch(kind, id.kind));
        }
        let schema = Arc::clone(self.schemas.require(kind)?);
        let record = self.arena.get(id).ok_or_else(|| Error::entity_not_found(id))?;
        let source = record.source.clone();

        let old_plan = plan_references(&schema, record.payload.as_ref())?;
        let mut payload = record.payload.boxed_clone();
        mutate(payload.as_mut())?;

        check_value_properties(&schema, payload.as_ref())?;
        let new_plan = plan_references(&schema, payload.as_ref())?;
        for ((reference, old), new) in schema.references.iter().zip(&old_plan).zip(&new_plan) {
            if old.write != new.write {
                check_reference_targets(&self.arena, reference, &new.write)?;
            }
        }

        let record = Record::new(payload, source);
        let view = EntityView::new(id, &record, schema);
        self.arena.replace(id, record);
        for (old, new) in old_plan.iter().zip(&new_plan) {
            if old.write != new.write {
                apply_reference_write(&mut self.refs, id.array_id, new);
            }
        }
        Ok(view)
    }

    /// Replaces only the provenance tag of a live entity.
    ///
    /// Payload and id are unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not live.
    pub fn change_source(&mut self, id: EntityId, source: EntitySource) -> Result<EntityView> {
        let record = self.arena.get(id).ok_or_else(|| Error::entity_not_found(id))?;
        let schema = Arc::clone(self.schemas.require(id.kind)?);

        let updated = Record {
            payload: Arc::clone(&record.payload),
            source,
        };
        let view = EntityView::new(id, &updated, schema);
        self.arena.replace(id, updated);
        Ok(view)
    }

    /// Removes a live entity and, transitively, its hard children.
    ///
    /// Children are removed before their parents, depth first, so no hard
    /// child is ever left dangling. Soft children survive and merely lose
    /// their link. The id is tombstoned and never reused.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not live.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<()> {
        if !self.arena.contains(id) {
            return Err(Error::entity_not_found(id));
        }
        self.remove_recursive(id);
        Ok(())
    }

    fn remove_recursive(&mut self, id: EntityId) {
        let hard = self.refs.hard_children_of(id.kind, id.array_id);
        for (child_kind, children) in hard {
            for child_array_id in &children {
                let child = EntityId::new(child_kind, child_array_id);
                // An earlier sibling's cascade may have reached it already.
                if self.arena.contains(child) {
                    self.remove_recursive(child);
                }
            }
        }

        // Drop every link the entity still participates in. Hard children
        // are gone by now; soft children are detached, not removed.
        for connection in self.refs.parents(id.kind, id.array_id).keys() {
            self.refs.remove_one_to_many(*connection, id.array_id);
        }
        for connection in self.refs.children(id.kind, id.array_id).keys() {
            self.refs.remove_many_to_one(*connection, id.array_id);
        }
        self.arena.remove(id);
    }

    /// Produces a standalone immutable snapshot.
    ///
    /// Untouched columns and connections are shared by reference, not
    /// copied. The builder remains independently usable; later edits never
    /// reach the snapshot.
    #[must_use]
    pub fn freeze(&self) -> Snapshot {
        Snapshot {
            schemas: Arc::clone(&self.schemas),
            arena: self.arena.clone(),
            refs: self.refs.freeze(),
        }
    }

    /// Looks up a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityView> {
        lookup_view(&self.schemas, &self.arena, id)
    }

    /// Checks whether an id addresses a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.arena.contains(id)
    }

    /// Iterates over one kind's live entities in ascending id order.
    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = EntityView> + '_ {
        kind_views(&self.schemas, &self.arena, kind)
    }

    /// Returns the total number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Groups every live entity whose source satisfies `predicate` by
    /// source, then by kind.
    pub fn entities_by_source<F>(
        &self,
        predicate: F,
    ) -> HashMap<EntitySource, HashMap<EntityKind, Vec<EntityView>>>
    where
        F: Fn(&EntitySource) -> bool,
    {
        group_by_source(&self.schemas, &self.arena, predicate)
    }

    /// Resolves the children of `parent` under one connection.
    ///
    /// # Panics
    ///
    /// Panics if the reference table addresses a dead entity; unreachable
    /// short of a storage bug.
    #[must_use]
    pub fn children(&self, connection: ConnectionId, parent: EntityId) -> Vec<EntityView> {
        let children = self.refs.children_for(connection, parent.array_id);
        resolve_children(&self.schemas, &self.arena, connection, &children)
    }

    /// Resolves the parent of `child` under one connection.
    ///
    /// # Panics
    ///
    /// Panics if the reference table addresses a dead entity; unreachable
    /// short of a storage bug.
    #[must_use]
    pub fn parent(&self, connection: ConnectionId, child: EntityId) -> Option<EntityView> {
        let parent_id = self.refs.parent_for(connection, child.array_id)?;
        Some(resolve_parent(&self.schemas, &self.arena, connection, parent_id))
    }
}

// ===== Shared read helpers =====

fn lookup_view(schemas: &SchemaSet, arena: &EntityArena, id: EntityId) -> Option<EntityView> {
    let record = arena.get(id)?;
    let schema = schemas.get(id.kind)?;
    Some(EntityView::new(id, record, Arc::clone(schema)))
}

fn kind_views<'a>(
    schemas: &'a SchemaSet,
    arena: &'a EntityArena,
    kind: EntityKind,
) -> impl Iterator<Item = EntityView> + 'a {
    let schema = schemas.get(kind);
    arena.entities(kind).filter_map(move |(array_id, record)| {
        let schema = Arc::clone(schema?);
        Some(EntityView::new(EntityId::new(kind, array_id), record, schema))
    })
}

fn group_by_source<F>(
    schemas: &SchemaSet,
    arena: &EntityArena,
    predicate: F,
) -> HashMap<EntitySource, HashMap<EntityKind, Vec<EntityView>>>
where
    F: Fn(&EntitySource) -> bool,
{
    let mut grouped: HashMap<EntitySource, HashMap<EntityKind, Vec<EntityView>>> = HashMap::new();
    for (id, record) in arena.iter() {
        if !predicate(&record.source) {
            continue;
        }
        let Some(schema) = schemas.get(id.kind) else {
            continue;
        };
        let view = EntityView::new(id, record, Arc::clone(schema));
        grouped
            .entry(record.source.clone())
            .or_default()
            .entry(id.kind)
            .or_default()
            .push(view);
    }
    grouped
}

fn resolve_children(
    schemas: &SchemaSet,
    arena: &EntityArena,
    connection: ConnectionId,
    children: &IntSeq,
) -> Vec<EntityView> {
    children
        .iter()
        .map(|array_id| {
            let id = EntityId::new(connection.child(), array_id);
            lookup_view(schemas, arena, id).expect("reference table addresses a live entity")
        })
        .collect()
}

fn resolve_parent(
    schemas: &SchemaSet,
    arena: &EntityArena,
    connection: ConnectionId,
    parent_id: u32,
) -> EntityView {
    let id = EntityId::new(connection.parent(), parent_id);
    lookup_view(schemas, arena, id).expect("reference table addresses a live entity")
}

// ===== Edit validation and planning =====

/// One declared reference property, extracted from a payload.
#[derive(Debug, PartialEq)]
struct PlannedRef {
    connection: ConnectionId,
    write: RefWrite,
}

/// The table write a reference property's value translates to.
#[derive(Debug, PartialEq)]
enum RefWrite {
    /// Replace the entity's full child set under the connection.
    Children(Vec<EntityId>),
    /// Point the entity at a parent, or detach it.
    Parent(Option<EntityId>),
}

impl RefWrite {
    /// True when applying the write would register no link.
    fn is_neutral(&self) -> bool {
        match self {
            Self::Children(children) => children.is_empty(),
            Self::Parent(parent) => parent.is_none(),
        }
    }
}

fn check_value_properties(schema: &EntitySchema, payload: &dyn Payload) -> Result<()> {
    for property in &schema.properties {
        let value = payload.get(&property.name).ok_or_else(|| {
            Error::unknown_property(schema.name.as_ref(), property.name.as_ref())
        })?;
        let actual = value.value_type();
        if !property.ty.accepts(&actual) {
            return Err(Error::property_type_mismatch(
                property.name.as_ref(),
                property.ty.clone(),
                actual,
            ));
        }
    }
    Ok(())
}

fn plan_references(schema: &EntitySchema, payload: &dyn Payload) -> Result<Vec<PlannedRef>> {
    schema
        .references
        .iter()
        .map(|reference| {
            let write = extract_reference(schema, reference, payload)?;
            Ok(PlannedRef {
                connection: reference.connection(schema.kind),
                write,
            })
        })
        .collect()
}

fn extract_reference(
    schema: &EntitySchema,
    reference: &ReferenceSchema,
    payload: &dyn Payload,
) -> Result<RefWrite> {
    let value = payload.get(&reference.name).ok_or_else(|| {
        Error::unknown_property(schema.name.as_ref(), reference.name.as_ref())
    })?;
    match reference.cardinality {
        Cardinality::OneToMany => match &value {
            Value::Nil => Ok(RefWrite::Children(Vec::new())),
            Value::List(items) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    let Value::Ref(child) = item else {
                        return Err(Error::property_type_mismatch(
                            reference.name.as_ref(),
                            PropertyType::Ref,
                            item.value_type(),
                        ));
                    };
                    children.push(*child);
                }
                Ok(RefWrite::Children(children))
            }
            other => Err(Error::property_type_mismatch(
                reference.name.as_ref(),
                PropertyType::list(PropertyType::Ref),
                other.value_type(),
            )),
        },
        Cardinality::ManyToOne => match &value {
            Value::Nil => Ok(RefWrite::Parent(None)),
            Value::Ref(parent) => Ok(RefWrite::Parent(Some(*parent))),
            other => Err(Error::property_type_mismatch(
                reference.name.as_ref(),
                PropertyType::Ref,
                other.value_type(),
            )),
        },
    }
}

fn check_reference_targets(
    arena: &EntityArena,
    reference: &ReferenceSchema,
    write: &RefWrite,
) -> Result<()> {
    let targets: &[EntityId] = match write {
        RefWrite::Children(children) => children,
        RefWrite::Parent(Some(parent)) => std::slice::from_ref(parent),
        RefWrite::Parent(None) => &[],
    };
    for target in targets {
        if target.kind != reference.target {
            return Err(Error::kind_mismatch(reference.target, target.kind));
        }
        if !arena.contains(*target) {
            return Err(Error::entity_not_found(*target));
        }
    }
    Ok(())
}

fn apply_reference_write(refs: &mut MutableRefsTable, array_id: u32, planned: &PlannedRef) {
    match &planned.write {
        RefWrite::Children(children) => {
            refs.update_one_to_many(
                planned.connection,
                array_id,
                children.iter().map(|child| child.array_id),
            );
        }
        RefWrite::Parent(Some(parent)) => {
            refs.update_many_to_one(planned.connection, array_id, parent.array_id);
        }
        RefWrite::Parent(None) => {
            refs.remove_one_to_many(planned.connection, array_id);
        }
    }
}
