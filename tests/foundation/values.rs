//! Integration tests for Value types
//!
//! Tests Value enum variants, equality, hashing, display, and conversions.

use std::collections::HashSet;
use std::sync::Arc;

use strata_foundation::{EntityId, EntityKind, EntitySource, PropertyType, Value};

// =============================================================================
// Value Construction
// =============================================================================

#[test]
fn value_nil() {
    let v = Value::Nil;
    assert!(v.is_nil());
    assert_eq!(v.value_type(), PropertyType::Nil);
}

#[test]
fn value_default_is_nil() {
    assert!(Value::default().is_nil());
}

#[test]
fn value_bool() {
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Bool(false).as_bool(), Some(false));
    assert_eq!(Value::Nil.as_bool(), None);
}

#[test]
fn value_int() {
    let v = Value::Int(42);
    assert_eq!(v.as_int(), Some(42));
    assert_eq!(v.as_float(), None);
    assert_eq!(v.as_number(), Some(42.0));
}

#[test]
fn value_float() {
    let v = Value::Float(1.5);
    assert_eq!(v.as_float(), Some(1.5));
    assert_eq!(v.as_int(), None);
    assert_eq!(v.as_number(), Some(1.5));
}

#[test]
fn value_string() {
    let v = Value::String(Arc::from("hello"));
    assert_eq!(v.as_str(), Some("hello"));
    assert_eq!(Value::from("hello"), v);
    assert_eq!(Value::from("hello".to_string()), v);
}

#[test]
fn value_ref() {
    let id = EntityId::new(EntityKind::new(1), 0);
    let v = Value::Ref(id);
    assert_eq!(v.as_ref_id(), Some(id));
    assert_eq!(Value::from(id), v);
}

#[test]
fn value_list_from_vec() {
    let v = Value::from(vec![1i64, 2, 3]);
    let list = v.as_list().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(0), Some(&Value::Int(1)));
    assert_eq!(list.get(2), Some(&Value::Int(3)));
}

// =============================================================================
// Value Equality
// =============================================================================

#[test]
fn value_equality_scalars() {
    assert_eq!(Value::Nil, Value::Nil);
    assert_eq!(Value::Bool(true), Value::Bool(true));
    assert_eq!(Value::Int(42), Value::Int(42));
    assert_ne!(Value::Int(42), Value::Int(43));
    assert_eq!(Value::from("hello"), Value::from("hello"));
    assert_ne!(Value::from("hello"), Value::from("world"));
}

#[test]
fn value_equality_int_float_not_equal() {
    // Int and Float are different types, even with the same numeric value
    assert_ne!(Value::Int(42), Value::Float(42.0));
}

#[test]
fn value_equality_refs() {
    let a = EntityId::new(EntityKind::new(0), 1);
    let b = EntityId::new(EntityKind::new(0), 1);
    let c = EntityId::new(EntityKind::new(1), 1);

    assert_eq!(Value::Ref(a), Value::Ref(b));
    assert_ne!(Value::Ref(a), Value::Ref(c));
}

#[test]
fn value_equality_lists() {
    let a = Value::from(vec![1i64, 2]);
    let b = Value::from(vec![1i64, 2]);
    let c = Value::from(vec![2i64, 1]);

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn value_nan_equals_itself() {
    // Bit equality keeps Eq reflexive for floats.
    let nan = Value::Float(f64::NAN);
    assert_eq!(nan, nan);
}

// =============================================================================
// Value Hashing (for use in HashSet/HashMap)
// =============================================================================

#[test]
fn value_hash_consistency() {
    let mut set = HashSet::new();
    set.insert(Value::Int(42));
    assert!(set.contains(&Value::Int(42)));
    assert!(!set.contains(&Value::Int(43)));
}

#[test]
fn value_hash_mixed_types() {
    let mut set = HashSet::new();
    set.insert(Value::Nil);
    set.insert(Value::Bool(true));
    set.insert(Value::Int(42));
    set.insert(Value::from("hello"));

    assert_eq!(set.len(), 4);
    assert!(set.contains(&Value::Nil));
    assert!(set.contains(&Value::from("hello")));
}

// =============================================================================
// Value Display
// =============================================================================

#[test]
fn value_display_scalars() {
    assert_eq!(format!("{}", Value::Nil), "nil");
    assert_eq!(format!("{}", Value::Bool(true)), "true");
    assert_eq!(format!("{}", Value::Int(-17)), "-17");
    assert_eq!(format!("{}", Value::from("hello")), "hello");
}

#[test]
fn value_display_ref() {
    let v = Value::Ref(EntityId::new(EntityKind::new(3), 42));
    let display = format!("{v}");
    assert!(display.contains("3:42"));
}

#[test]
fn value_display_list() {
    let v = Value::from(vec![1i64, 2, 3]);
    assert_eq!(format!("{v}"), "[1 2 3]");
}

// =============================================================================
// Value Type Descriptors
// =============================================================================

#[test]
fn value_type_reports_variant() {
    assert_eq!(Value::Bool(true).value_type(), PropertyType::Bool);
    assert_eq!(Value::Int(1).value_type(), PropertyType::Int);
    assert_eq!(Value::Float(1.0).value_type(), PropertyType::Float);
    assert_eq!(Value::from("x").value_type(), PropertyType::String);
    assert_eq!(
        Value::from(vec![1i64]).value_type(),
        PropertyType::list(PropertyType::Any)
    );
}

#[test]
fn property_type_accepts_nil_everywhere() {
    // A property may always be unset.
    assert!(PropertyType::Int.accepts(&PropertyType::Nil));
    assert!(PropertyType::String.accepts(&PropertyType::Nil));
    assert!(PropertyType::list(PropertyType::Ref).accepts(&PropertyType::Nil));
}

#[test]
fn property_type_numeric_promotion() {
    assert!(PropertyType::Float.accepts(&PropertyType::Int));
    assert!(!PropertyType::Int.accepts(&PropertyType::Float));
}

// =============================================================================
// EntityId
// =============================================================================

#[test]
fn entity_id_construction() {
    let id = EntityId::new(EntityKind::new(2), 42);
    assert_eq!(id.kind, EntityKind::new(2));
    assert_eq!(id.array_id, 42);
}

#[test]
fn entity_id_equality() {
    let id1 = EntityId::new(EntityKind::new(1), 0);
    let id2 = EntityId::new(EntityKind::new(1), 0);
    let id3 = EntityId::new(EntityKind::new(2), 0); // different kind
    let id4 = EntityId::new(EntityKind::new(1), 1); // different array id

    assert_eq!(id1, id2);
    assert_ne!(id1, id3);
    assert_ne!(id1, id4);
}

#[test]
fn entity_id_hash() {
    let mut set = HashSet::new();
    set.insert(EntityId::new(EntityKind::new(1), 0));
    set.insert(EntityId::new(EntityKind::new(2), 0));
    set.insert(EntityId::new(EntityKind::new(1), 0)); // duplicate

    assert_eq!(set.len(), 2);
}

#[test]
fn entity_id_display() {
    let id = EntityId::new(EntityKind::new(2), 42);
    assert_eq!(format!("{id}"), "Entity(2:42)");
    assert_eq!(format!("{id:?}"), "EntityId(2:42)");
}

// =============================================================================
// EntitySource
// =============================================================================

#[test]
fn source_equality_and_hash() {
    let a = EntitySource::from("module/main");
    let b = EntitySource::new("module/main".to_string());
    let c = EntitySource::from("module/other");

    assert_eq!(a, b);
    assert_ne!(a, c);

    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&c));
}

#[test]
fn source_round_trip() {
    let s = EntitySource::from("generated");
    assert_eq!(s.as_str(), "generated");
    assert_eq!(format!("{s}"), "generated");
}
