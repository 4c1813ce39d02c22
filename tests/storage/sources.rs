//! Integration tests for entity provenance
//!
//! Tests source grouping, predicate filtering, and retagging entities
//! without disturbing their identity or payload.

use strata_foundation::{ErrorKind, Value};

use crate::support::{
    MODULE, PROJECT, add_module, modules_conn, new_builder, source,
};

fn tagged_project(builder: &mut strata_storage::Builder, tag: &str, name: &str) {
    builder
        .add_entity(PROJECT, source(tag), |payload| {
            payload.set("name", Value::from(name))
        })
        .unwrap();
}

fn tagged_module(
    builder: &mut strata_storage::Builder,
    tag: &str,
    name: &str,
) -> strata_storage::EntityView {
    builder
        .add_entity(MODULE, source(tag), |payload| {
            payload.set("name", Value::from(name))?;
            payload.set("version", Value::Int(1))
        })
        .unwrap()
}

// =============================================================================
// Grouping
// =============================================================================

#[test]
fn entities_group_by_source_then_kind() {
    let mut builder = new_builder();
    tagged_project(&mut builder, "crates/alpha", "alpha");
    tagged_module(&mut builder, "crates/alpha", "core");
    tagged_module(&mut builder, "crates/alpha", "util");
    tagged_module(&mut builder, "crates/beta", "net");

    let groups = builder.entities_by_source(|_| true);
    assert_eq!(groups.len(), 2);

    let alpha = &groups[&source("crates/alpha")];
    assert_eq!(alpha[&PROJECT].len(), 1);
    assert_eq!(alpha[&MODULE].len(), 2);

    let beta = &groups[&source("crates/beta")];
    assert!(!beta.contains_key(&PROJECT));
    assert_eq!(beta[&MODULE].len(), 1);
}

#[test]
fn grouped_views_carry_their_payloads() {
    let mut builder = new_builder();
    tagged_module(&mut builder, "crates/alpha", "core");

    let groups = builder.entities_by_source(|_| true);
    let modules = &groups[&source("crates/alpha")][&MODULE];
    assert_eq!(modules[0].get("name"), Some(Value::from("core")));
    assert_eq!(modules[0].source(), &source("crates/alpha"));
}

#[test]
fn the_predicate_selects_sources() {
    let mut builder = new_builder();
    tagged_module(&mut builder, "crates/alpha", "core");
    tagged_module(&mut builder, "crates/beta", "net");
    tagged_module(&mut builder, "vendor/gamma", "ffi");

    let groups = builder.entities_by_source(|s| s.as_str().starts_with("crates/"));
    assert_eq!(groups.len(), 2);
    assert!(groups.contains_key(&source("crates/alpha")));
    assert!(groups.contains_key(&source("crates/beta")));
    assert!(!groups.contains_key(&source("vendor/gamma")));
}

#[test]
fn an_unmatched_predicate_yields_nothing() {
    let mut builder = new_builder();
    tagged_module(&mut builder, "crates/alpha", "core");

    let groups = builder.entities_by_source(|_| false);
    assert!(groups.is_empty());
}

#[test]
fn removed_entities_leave_their_group() {
    let mut builder = new_builder();
    let core = tagged_module(&mut builder, "crates/alpha", "core");
    tagged_module(&mut builder, "crates/alpha", "util");

    builder.remove_entity(core.id()).unwrap();

    let groups = builder.entities_by_source(|_| true);
    let modules = &groups[&source("crates/alpha")][&MODULE];
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].get("name"), Some(Value::from("util")));
}

#[test]
fn an_emptied_source_disappears_from_the_grouping() {
    let mut builder = new_builder();
    let core = tagged_module(&mut builder, "crates/alpha", "core");
    tagged_module(&mut builder, "crates/beta", "net");

    builder.remove_entity(core.id()).unwrap();

    let groups = builder.entities_by_source(|_| true);
    assert!(!groups.contains_key(&source("crates/alpha")));
    assert!(groups.contains_key(&source("crates/beta")));
}

// =============================================================================
// Retagging
// =============================================================================

#[test]
fn change_source_moves_an_entity_between_groups() {
    let mut builder = new_builder();
    let core = tagged_module(&mut builder, "crates/alpha", "core");

    let moved = builder.change_source(core.id(), source("crates/beta")).unwrap();
    assert_eq!(moved.id(), core.id());
    assert_eq!(moved.get("name"), Some(Value::from("core")));
    assert_eq!(moved.source(), &source("crates/beta"));

    let groups = builder.entities_by_source(|_| true);
    assert!(!groups.contains_key(&source("crates/alpha")));
    assert_eq!(groups[&source("crates/beta")][&MODULE].len(), 1);
}

#[test]
fn change_source_requires_a_live_entity() {
    let mut builder = new_builder();
    let core = tagged_module(&mut builder, "crates/alpha", "core");
    builder.remove_entity(core.id()).unwrap();

    let err = builder.change_source(core.id(), source("crates/beta")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
}

#[test]
fn change_source_keeps_relations_intact() {
    let mut builder = new_builder();
    let core = add_module(&mut builder, "core", 1);
    let project = crate::support::project_with_modules(&mut builder, "alpha", &[core.id()]);

    builder.change_source(core.id(), source("generated")).unwrap();

    let children = builder.children(modules_conn(), project.id());
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].source(), &source("generated"));
    assert_eq!(builder.parent(modules_conn(), core.id()).unwrap().id(), project.id());
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn snapshot_grouping_matches_the_builder() {
    let mut builder = new_builder();
    tagged_project(&mut builder, "crates/alpha", "alpha");
    tagged_module(&mut builder, "crates/alpha", "core");
    tagged_module(&mut builder, "crates/beta", "net");
    let snapshot = builder.freeze();

    let from_builder = builder.entities_by_source(|_| true);
    let from_snapshot = snapshot.entities_by_source(|_| true);

    assert_eq!(from_builder.len(), from_snapshot.len());
    for (tag, kinds) in &from_builder {
        let mirrored = &from_snapshot[tag];
        for (kind, views) in kinds {
            assert_eq!(mirrored[kind], *views);
        }
    }
}

#[test]
fn snapshot_groups_ignore_later_retags() {
    let mut builder = new_builder();
    let core = tagged_module(&mut builder, "crates/alpha", "core");
    let snapshot = builder.freeze();

    builder.change_source(core.id(), source("crates/beta")).unwrap();

    let groups = snapshot.entities_by_source(|_| true);
    assert!(groups.contains_key(&source("crates/alpha")));
    assert!(!groups.contains_key(&source("crates/beta")));
}
