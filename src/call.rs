//! Call handle collaborators and per-call configuration
//!
//! This module defines the narrow driver surface the output-sequencing
//! cursor consumes — a prepared call handle, the result sets it hands out,
//! and the resource registry that releases it — together with the
//! caller-declared configuration for one call: its kind, parameter bindings,
//! and result shape.
//!
//! The traits deliberately mirror the stateful, forward-only protocol real
//! drivers expose: each probe mutates driver-side position, and a result set
//! handed out for one position is consumed by reading it.

use crate::constants::{BindDirection, ScalarType};
use crate::error::DriverError;
use crate::row::Value;
use crate::types::TypeRegistry;

/// A prepared, in-flight stored procedure or function invocation.
///
/// The cursor owns the handle exclusively for its lifetime and drives it
/// through successive positions; every method is a direct, blocking call
/// into the driver.
pub trait CallHandle {
    /// Run the call. Returns true when the first outcome is a result set.
    fn execute(&mut self) -> Result<bool, DriverError>;

    /// Update count of the current position, or a negative sentinel when the
    /// position does not carry one
    fn update_count(&mut self) -> Result<i64, DriverError>;

    /// Step to the next position. Returns true when that position is a
    /// result set.
    fn more_results(&mut self) -> Result<bool, DriverError>;

    /// The result set at the current position; consumable once
    fn result_set(&mut self) -> Result<Box<dyn ResultSource>, DriverError>;

    /// Post-execution value of the out-capable parameter at `index`
    /// (binding declaration order; a function's return occupies slot 0)
    fn out_value(&mut self, index: usize) -> Result<Value, DriverError>;

    /// Diagnostic form of the call, used in error messages
    fn describe(&self) -> String;
}

/// A single driver result set, readable forward-only
pub trait ResultSource {
    /// Number of natural columns in each row
    fn column_count(&self) -> usize;

    /// Move to the next row; false once the cursor is exhausted
    fn next_row(&mut self) -> Result<bool, DriverError>;

    /// Read the value at a zero-based position of the current row
    fn value_at(&mut self, position: usize) -> Result<Value, DriverError>;

    /// Release the driver-held cursor
    fn close(&mut self) -> Result<(), DriverError>;
}

/// External registry through which the call handle is released
pub trait ResourceRegistry {
    /// Release the handle; idempotent from the caller's perspective
    fn release(&mut self, handle: &mut dyn CallHandle) -> Result<(), DriverError>;
}

/// The kind of call a cursor is driving, fixed per cursor instance.
///
/// The kind selects what, if anything, the cursor yields once the driver
/// reports no further result sets or update counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallKind {
    /// A plain statement; nothing is yielded at the terminal position
    #[default]
    Statement,
    /// A stored procedure; OUT/INOUT parameter values are yielded at the
    /// terminal position
    Procedure,
    /// A stored function; the return value is yielded at the terminal
    /// position
    Function,
}

impl CallKind {
    /// Check if this kind defines extended (out-parameter) returns
    pub fn defines_parameter_returns(&self) -> bool {
        matches!(self, CallKind::Procedure)
    }

    /// Check if this kind defines a function return
    pub fn defines_function_return(&self) -> bool {
        matches!(self, CallKind::Function)
    }
}

/// One declared call parameter: name, direction, and declared scalar type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamBinding {
    name: String,
    direction: BindDirection,
    declared: ScalarType,
}

impl ParamBinding {
    /// Create a binding with an explicit direction
    pub fn new(name: impl Into<String>, direction: BindDirection, declared: ScalarType) -> Self {
        Self {
            name: name.into(),
            direction,
            declared,
        }
    }

    /// Create an IN (input) binding
    pub fn input(name: impl Into<String>, declared: ScalarType) -> Self {
        Self::new(name, BindDirection::Input, declared)
    }

    /// Create an OUT (output) binding
    pub fn output(name: impl Into<String>, declared: ScalarType) -> Self {
        Self::new(name, BindDirection::Output, declared)
    }

    /// Create an IN OUT (input/output) binding
    pub fn input_output(name: impl Into<String>, declared: ScalarType) -> Self {
        Self::new(name, BindDirection::InputOutput, declared)
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter direction
    pub fn direction(&self) -> BindDirection {
        self.direction
    }

    /// Declared scalar type
    pub fn declared(&self) -> ScalarType {
        self.declared
    }
}

/// One caller-declared result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    label: String,
    declared: ScalarType,
}

impl Projection {
    /// Create a projection with a label and declared type
    pub fn new(label: impl Into<String>, declared: ScalarType) -> Self {
        Self {
            label: label.into(),
            declared,
        }
    }

    /// Projection label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared scalar type
    pub fn declared(&self) -> ScalarType {
        self.declared
    }
}

/// Caller-declared shape of the call's result rows.
///
/// With no explicit projections, every natural column of each result set is
/// read as-is; with projections, each row is decoded through the declared
/// types in order. For function calls the shape also carries the declared
/// return type.
#[derive(Debug, Clone, Default)]
pub struct ResultShape {
    projections: Vec<Projection>,
    function_return: Option<ScalarType>,
}

impl ResultShape {
    /// Create an empty shape (natural columns, no declared return)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declared projection
    pub fn with_projection(mut self, label: impl Into<String>, declared: ScalarType) -> Self {
        self.projections.push(Projection::new(label, declared));
        self
    }

    /// Declare the function's return type
    pub fn with_function_return(mut self, declared: ScalarType) -> Self {
        self.function_return = Some(declared);
        self
    }

    /// The declared projections, in declaration order
    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    /// Check if any explicit projections were declared
    pub fn has_explicit_projections(&self) -> bool {
        !self.projections.is_empty()
    }

    /// The declared function return type, if any
    pub fn function_return(&self) -> Option<ScalarType> {
        self.function_return
    }

    /// Check if the declared function return is cursor-typed
    pub fn returns_cursor(&self) -> bool {
        self.function_return == Some(ScalarType::Cursor)
    }
}

/// Everything the cursor needs to know about one call: its kind, declared
/// result shape, parameter bindings, and the active type registry.
#[derive(Debug, Clone)]
pub struct CallContext {
    kind: CallKind,
    shape: ResultShape,
    bindings: Vec<ParamBinding>,
    registry: TypeRegistry,
}

impl CallContext {
    /// Create a context for the given call kind, with an empty shape, no
    /// bindings, and the default type registry
    pub fn new(kind: CallKind) -> Self {
        Self {
            kind,
            shape: ResultShape::new(),
            bindings: Vec::new(),
            registry: TypeRegistry::with_defaults(),
        }
    }

    /// Set the declared result shape
    pub fn with_shape(mut self, shape: ResultShape) -> Self {
        self.shape = shape;
        self
    }

    /// Append a parameter binding (declaration order is preserved)
    pub fn with_binding(mut self, binding: ParamBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Replace the active type registry
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The call kind
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// The declared result shape
    pub fn shape(&self) -> &ResultShape {
        &self.shape
    }

    /// The parameter bindings, in declaration order
    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    /// The active type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}
