//! Shared constants and type codes
//!
//! This module defines the bind-direction and scalar type codes used when
//! describing call parameters and declared result projections, plus the
//! sentinel the driver protocol uses for "this position is not an update".

use std::fmt;

/// Update-count sentinel reported by drivers for a position that does not
/// carry an update count (i.e. it is a result set, or nothing at all).
pub const NO_UPDATE_COUNT: i64 = -1;

/// Direction of a call parameter binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindDirection {
    /// Output only parameter (server writes, client reads)
    Output,
    /// Input only parameter (client writes, server reads) - default
    #[default]
    Input,
    /// Input/Output parameter (bidirectional)
    InputOutput,
}

impl BindDirection {
    /// Check if this direction includes input (IN or IN OUT)
    pub fn is_input(&self) -> bool {
        matches!(self, BindDirection::Input | BindDirection::InputOutput)
    }

    /// Check if this direction includes output (OUT or IN OUT)
    pub fn is_output(&self) -> bool {
        matches!(self, BindDirection::Output | BindDirection::InputOutput)
    }
}

/// Scalar type code for declared parameters and projections
///
/// These are deliberately driver-neutral: a driver maps its own wire types
/// onto these codes when it produces [`Value`](crate::row::Value)s, and the
/// type registry resolves them to descriptors when decoding declared
/// projections and in/out parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Boolean
    Boolean,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Character data
    Text,
    /// Raw binary data
    Binary,
    /// JSON document
    Json,
    /// Cursor-typed value (a nested result set); not a scalar, and never
    /// resolvable through the default type registry
    Cursor,
}

impl ScalarType {
    /// Check if this code denotes a nested cursor rather than a scalar
    pub fn is_cursor(&self) -> bool {
        matches!(self, ScalarType::Cursor)
    }

    /// Lowercase name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Integer => "integer",
            ScalarType::Float => "float",
            ScalarType::Text => "text",
            ScalarType::Binary => "binary",
            ScalarType::Json => "json",
            ScalarType::Cursor => "cursor",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
