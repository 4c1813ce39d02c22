//! Payload protocol between the store and per-kind property containers.
//!
//! One concrete container type exists per entity kind. The store reads and
//! writes named properties through this trait without depending on any
//! concrete type; typed accessor layers downcast via [`Payload::as_any`].

use std::any::Any;
use std::fmt;

use strata_foundation::{Result, Value};

/// The property bag of one entity, independent of its identity.
pub trait Payload: fmt::Debug + Send + Sync + 'static {
    /// Reads a named property.
    ///
    /// Returns `None` for names the payload does not declare. Declared but
    /// unset properties read as [`Value::Nil`].
    fn get(&self, property: &str) -> Option<Value>;

    /// Writes a named property.
    ///
    /// # Errors
    ///
    /// Returns an error for names the payload does not declare.
    fn set(&mut self, property: &str, value: Value) -> Result<()>;

    /// Clones the payload behind the trait object.
    fn boxed_clone(&self) -> Box<dyn Payload>;

    /// Downcast hook for typed accessor layers.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Payload> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}
