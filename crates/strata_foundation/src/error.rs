//! Error types for the Strata system.
//!
//! Uses `thiserror` for ergonomic error definition.

use thiserror::Error;

use crate::entity::{EntityId, EntityKind};
use crate::types::PropertyType;

/// Convenient result alias for Strata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Strata operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates an entity kind mismatch error.
    #[must_use]
    pub fn kind_mismatch(expected: EntityKind, actual: EntityKind) -> Self {
        Self::new(ErrorKind::KindMismatch { expected, actual })
    }

    /// Creates an unknown kind error.
    #[must_use]
    pub fn unknown_kind(kind: EntityKind) -> Self {
        Self::new(ErrorKind::UnknownKind(kind))
    }

    /// Creates a kind already registered error.
    #[must_use]
    pub fn kind_already_registered(kind: EntityKind) -> Self {
        Self::new(ErrorKind::KindAlreadyRegistered(kind))
    }

    /// Creates a connection conflict error.
    #[must_use]
    pub fn connection_conflict(parent: EntityKind, child: EntityKind) -> Self {
        Self::new(ErrorKind::ConnectionConflict { parent, child })
    }

    /// Creates a hard reference cycle error.
    #[must_use]
    pub fn hard_reference_cycle(kind: EntityKind) -> Self {
        Self::new(ErrorKind::HardReferenceCycle { kind })
    }

    /// Creates an unknown property error.
    #[must_use]
    pub fn unknown_property(payload: impl Into<String>, property: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownProperty {
            payload: payload.into(),
            property: property.into(),
        })
    }

    /// Creates a property type mismatch error.
    #[must_use]
    pub fn property_type_mismatch(
        property: impl Into<String>,
        expected: PropertyType,
        actual: PropertyType,
    ) -> Self {
        Self::new(ErrorKind::PropertyTypeMismatch {
            property: property.into(),
            expected,
            actual,
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Entity was not found in storage (absent or removed).
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// An operation was declared with one entity kind but applied to another.
    #[error("entity kind mismatch: expected {expected:?}, got {actual:?}")]
    KindMismatch {
        /// The kind the operation was declared with.
        expected: EntityKind,
        /// The kind actually encountered.
        actual: EntityKind,
    },

    /// No schema is registered for the entity kind.
    #[error("unknown entity kind: {0:?}")]
    UnknownKind(EntityKind),

    /// A schema for the entity kind is already registered.
    #[error("entity kind already registered: {0:?}")]
    KindAlreadyRegistered(EntityKind),

    /// The same (parent, child) type pair was declared with differing hardness.
    #[error("conflicting connection {parent:?} -> {child:?}: hardness differs from prior declaration")]
    ConnectionConflict {
        /// Parent side of the connection.
        parent: EntityKind,
        /// Child side of the connection.
        child: EntityKind,
    },

    /// Hard reference declarations form a cycle.
    #[error("hard reference cycle through {kind:?}")]
    HardReferenceCycle {
        /// A kind on the cycle.
        kind: EntityKind,
    },

    /// Property not declared on the payload.
    #[error("unknown property: {property} on {payload}")]
    UnknownProperty {
        /// The payload type that was addressed.
        payload: String,
        /// The property name that was not found.
        property: String,
    },

    /// Property value has the wrong type.
    #[error("property type mismatch: {property} expects {expected}, got {actual}")]
    PropertyTypeMismatch {
        /// The property name.
        property: String,
        /// The declared type.
        expected: PropertyType,
        /// The actual value type encountered.
        actual: PropertyType,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}
