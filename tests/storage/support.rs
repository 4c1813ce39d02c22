//! Shared fixtures: a small project graph with typed payloads.
//!
//! Projects own modules (hard), modules own facets (hard), libraries point
//! at an owning module (soft).

use std::any::Any;

use strata_foundation::{EntityId, EntityKind, EntitySource, Error, PropertyType, Result, Value};
use strata_storage::{
    Builder, ConnectionId, EntitySchema, EntityView, Hardness, Payload, PropertySchema,
    ReferenceSchema, SchemaSet,
};

pub const PROJECT: EntityKind = EntityKind::new(0);
pub const MODULE: EntityKind = EntityKind::new(1);
pub const FACET: EntityKind = EntityKind::new(2);
pub const LIBRARY: EntityKind = EntityKind::new(3);

#[derive(Clone, Debug, Default)]
pub struct ProjectData {
    pub name: Value,
    pub modules: Value,
}

impl Payload for ProjectData {
    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "name" => Some(self.name.clone()),
            "modules" => Some(self.modules.clone()),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "name" => self.name = value,
            "modules" => self.modules = value,
            _ => return Err(Error::unknown_property("ProjectData", property)),
        }
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModuleData {
    pub name: Value,
    pub version: Value,
    pub facets: Value,
}

impl Payload for ModuleData {
    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "name" => Some(self.name.clone()),
            "version" => Some(self.version.clone()),
            "facets" => Some(self.facets.clone()),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "name" => self.name = value,
            "version" => self.version = value,
            "facets" => self.facets = value,
            _ => return Err(Error::unknown_property("ModuleData", property)),
        }
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct FacetData {
    pub name: Value,
}

impl Payload for FacetData {
    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "name" => Some(self.name.clone()),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "name" => self.name = value,
            _ => return Err(Error::unknown_property("FacetData", property)),
        }
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct LibraryData {
    pub name: Value,
    pub owner: Value,
}

impl Payload for LibraryData {
    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "name" => Some(self.name.clone()),
            "owner" => Some(self.owner.clone()),
            _ => None,
        }
    }

    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "name" => self.name = value,
            "owner" => self.owner = value,
            _ => return Err(Error::unknown_property("LibraryData", property)),
        }
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn schema_set() -> SchemaSet {
    let mut set = SchemaSet::new();
    set.register(
        EntitySchema::new(PROJECT, "Project", || Box::new(ProjectData::default()))
            .with_property(PropertySchema::new("name", PropertyType::String))
            .with_reference(ReferenceSchema::children("modules", MODULE, Hardness::Hard)),
    )
    .unwrap();
    set.register(
        EntitySchema::new(MODULE, "Module", || Box::new(ModuleData::default()))
            .with_property(PropertySchema::new("name", PropertyType::String))
            .with_property(PropertySchema::new("version", PropertyType::Int))
            .with_reference(ReferenceSchema::children("facets", FACET, Hardness::Hard)),
    )
    .unwrap();
    set.register(
        EntitySchema::new(FACET, "Facet", || Box::new(FacetData::default()))
            .with_property(PropertySchema::new("name", PropertyType::String)),
    )
    .unwrap();
    set.register(
        EntitySchema::new(LIBRARY, "Library", || Box::new(LibraryData::default()))
            .with_property(PropertySchema::new("name", PropertyType::String))
            .with_reference(ReferenceSchema::parent("owner", MODULE, Hardness::Soft)),
    )
    .unwrap();
    set
}

pub fn new_builder() -> Builder {
    Builder::new(schema_set())
}

pub fn source(tag: &str) -> EntitySource {
    EntitySource::from(tag)
}

pub fn modules_conn() -> ConnectionId {
    ConnectionId::new(PROJECT, MODULE, Hardness::Hard)
}

pub fn facets_conn() -> ConnectionId {
    ConnectionId::new(MODULE, FACET, Hardness::Hard)
}

pub fn owner_conn() -> ConnectionId {
    ConnectionId::new(MODULE, LIBRARY, Hardness::Soft)
}

pub fn add_project(builder: &mut Builder, name: &str) -> EntityView {
    builder
        .add_entity(PROJECT, source("tests"), |payload| {
            payload.set("name", Value::from(name))
        })
        .unwrap()
}

pub fn add_module(builder: &mut Builder, name: &str, version: i64) -> EntityView {
    builder
        .add_entity(MODULE, source("tests"), |payload| {
            payload.set("name", Value::from(name))?;
            payload.set("version", Value::Int(version))
        })
        .unwrap()
}

pub fn add_facet(builder: &mut Builder, name: &str) -> EntityView {
    builder
        .add_entity(FACET, source("tests"), |payload| {
            payload.set("name", Value::from(name))
        })
        .unwrap()
}

pub fn add_library(builder: &mut Builder, name: &str, owner: EntityId) -> EntityView {
    builder
        .add_entity(LIBRARY, source("tests"), move |payload| {
            payload.set("name", Value::from(name))?;
            payload.set("owner", Value::Ref(owner))
        })
        .unwrap()
}

pub fn project_with_modules(builder: &mut Builder, name: &str, modules: &[EntityId]) -> EntityView {
    let refs: Vec<Value> = modules.iter().copied().map(Value::Ref).collect();
    builder
        .add_entity(PROJECT, source("tests"), move |payload| {
            payload.set("name", Value::from(name))?;
            payload.set("modules", Value::from(refs))
        })
        .unwrap()
}

pub fn module_with_facets(builder: &mut Builder, name: &str, facets: &[EntityId]) -> EntityView {
    let refs: Vec<Value> = facets.iter().copied().map(Value::Ref).collect();
    builder
        .add_entity(MODULE, source("tests"), move |payload| {
            payload.set("name", Value::from(name))?;
            payload.set("version", Value::Int(1))?;
            payload.set("facets", Value::from(refs))
        })
        .unwrap()
}
