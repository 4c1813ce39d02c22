//! Property type descriptors for schema validation.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for a declared entity property.
///
/// Used to validate payload values when entities are added or modified.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropertyType {
    /// The nil type (only value: nil).
    Nil,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// String type.
    String,
    /// Entity reference type.
    Ref,
    /// Homogeneous list type.
    List(Box<PropertyType>),
    /// Any type (accepts any value).
    Any,
}

impl PropertyType {
    /// Creates a list type with the given element type.
    #[must_use]
    pub fn list(element: PropertyType) -> Self {
        Self::List(Box::new(element))
    }

    /// Returns true if this type is `Any`.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Checks if a value type is accepted by this type.
    ///
    /// This performs structural type checking:
    /// - `Any` accepts all types
    /// - `Nil` is accepted by every type (a property may always be unset)
    /// - `Float` accepts `Int` (numeric promotion)
    /// - Other primitive types must match exactly
    /// - List types check element types recursively
    #[must_use]
    pub fn accepts(&self, value_type: &PropertyType) -> bool {
        if matches!(self, Self::Any) || matches!(value_type, Self::Nil) {
            return true;
        }

        match (self, value_type) {
            (Self::Bool, Self::Bool)
            | (Self::Int | Self::Float, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::String, Self::String)
            | (Self::Ref, Self::Ref) => true,

            // List(Any) indicates a runtime value whose element types are not
            // known statically; accept it when expecting any list.
            (Self::List(expected_elem), Self::List(actual_elem)) => {
                actual_elem.is_any() || expected_elem.accepts(actual_elem)
            }

            _ => false,
        }
    }
}

impl fmt::Debug for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Ref => write!(f, "ref"),
            Self::List(t) => write!(f, "list<{t:?}>"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
