//! Scalar descriptors and the type registry
//!
//! Declared projections and in/out parameters name a [`ScalarType`]; before
//! extraction, those declarations are resolved through the active
//! [`TypeRegistry`] into [`ScalarDescriptor`]s, which coerce the raw driver
//! values into their declared shape. Resolution can fail: a registry is free
//! to not know a type, and cursor types are deliberately never resolvable as
//! scalars.

use indexmap::IndexMap;

use crate::constants::ScalarType;
use crate::error::{Error, Result};
use crate::row::Value;

/// Coerces raw driver values into one declared scalar type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarDescriptor {
    scalar: ScalarType,
}

impl ScalarDescriptor {
    /// Create a descriptor for the given scalar type
    pub fn new(scalar: ScalarType) -> Self {
        Self { scalar }
    }

    /// The scalar type this descriptor decodes to
    pub fn scalar(&self) -> ScalarType {
        self.scalar
    }

    /// Coerce a raw driver value into the declared scalar type.
    ///
    /// NULL always passes through. Fails with [`Error::DataConversion`]
    /// when the raw value has no representation in the declared type;
    /// `position` is only used for the diagnostic.
    pub fn coerce(&self, position: usize, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let coerced = match (self.scalar, value) {
            (ScalarType::Boolean, Value::Boolean(b)) => Some(Value::Boolean(b)),
            (ScalarType::Boolean, Value::Integer(i)) => Some(Value::Boolean(i != 0)),
            (ScalarType::Integer, Value::Integer(i)) => Some(Value::Integer(i)),
            (ScalarType::Integer, Value::Float(f)) => Some(Value::Integer(f as i64)),
            (ScalarType::Float, Value::Float(f)) => Some(Value::Float(f)),
            (ScalarType::Float, Value::Integer(i)) => Some(Value::Float(i as f64)),
            (ScalarType::Text, Value::Text(s)) => Some(Value::Text(s)),
            (ScalarType::Binary, Value::Binary(b)) => Some(Value::Binary(b)),
            (ScalarType::Binary, Value::Text(s)) => Some(Value::Binary(s.into_bytes())),
            (ScalarType::Json, Value::Json(j)) => Some(Value::Json(j)),
            (ScalarType::Cursor, Value::Cursor(c)) => Some(Value::Cursor(c)),
            _ => None,
        };
        coerced.ok_or(Error::DataConversion {
            position,
            declared: self.scalar,
        })
    }
}

/// Registry resolving declared scalar types to descriptors
///
/// The default registry covers every scalar code; [`ScalarType::Cursor`] is
/// intentionally absent, so an in/out parameter declared as a cursor is a
/// configuration fault rather than a silently mis-decoded column. Custom
/// descriptors can be registered on top of, or instead of, the defaults.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    descriptors: IndexMap<ScalarType, ScalarDescriptor>,
}

impl TypeRegistry {
    /// Create a registry with no registered descriptors
    pub fn empty() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Create a registry covering every scalar type code
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for scalar in [
            ScalarType::Boolean,
            ScalarType::Integer,
            ScalarType::Float,
            ScalarType::Text,
            ScalarType::Binary,
            ScalarType::Json,
        ] {
            registry.register(ScalarDescriptor::new(scalar));
        }
        registry
    }

    /// Register a descriptor, replacing any previous one for its type
    pub fn register(&mut self, descriptor: ScalarDescriptor) {
        self.descriptors.insert(descriptor.scalar(), descriptor);
    }

    /// Resolve a descriptor for a declared type, or signal "not resolvable"
    pub fn resolve(&self, scalar: ScalarType) -> Option<ScalarDescriptor> {
        self.descriptors.get(&scalar).copied()
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if no descriptors are registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
