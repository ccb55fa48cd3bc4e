//! Error types for call output sequencing
//!
//! This module defines all error types that can occur while walking the
//! outputs of a stored procedure or function call, from wrapped driver
//! faults to caller configuration mistakes.

use thiserror::Error;

use crate::constants::ScalarType;

/// Opaque error produced by a collaborating driver implementation
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for output sequencing
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Driver Communication Errors
    // =========================================================================
    /// A probe or read against the underlying driver failed. Driver state
    /// after a failed probe is undefined, so these are never retried.
    #[error("error calling {operation} on {statement}: {source}")]
    Driver {
        /// The driver operation that failed
        operation: &'static str,
        /// Diagnostic form of the call handle
        statement: String,
        /// The underlying driver error
        #[source]
        source: DriverError,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// An in/out parameter whose declared type has no resolvable scalar
    /// descriptor in the active type registry
    #[error("in/out parameter {parameter} declared as {declared} has no scalar descriptor")]
    UnsupportedBinding {
        /// Name of the offending parameter
        parameter: String,
        /// The unresolvable declared type
        declared: ScalarType,
    },

    /// A declared result projection whose type has no resolvable scalar
    /// descriptor in the active type registry
    #[error("projection {label} declared as {declared} has no scalar descriptor")]
    UnresolvableProjection {
        /// Label of the offending projection
        label: String,
        /// The unresolvable declared type
        declared: ScalarType,
    },

    /// Output was requested at a position past what `advance()` already
    /// reported as exhausted
    #[error("no further output at the current position")]
    NoMoreOutputs,

    /// A nested cursor was read a second time; nested result sets are
    /// consumable exactly once
    #[error("nested cursor already consumed")]
    CursorConsumed,

    /// A column value could not be coerced to its declared scalar type
    #[error("column {position} cannot be read as {declared}")]
    DataConversion {
        /// Zero-based column position
        position: usize,
        /// The declared scalar type
        declared: ScalarType,
    },
}

impl Error {
    /// Wrap a driver failure with the operation name and the call handle's
    /// diagnostic form
    pub fn driver(
        operation: &'static str,
        statement: impl Into<String>,
        source: impl Into<DriverError>,
    ) -> Self {
        Error::Driver {
            operation,
            statement: statement.into(),
            source: source.into(),
        }
    }

    /// Check if this is a wrapped driver-communication fault
    pub fn is_driver(&self) -> bool {
        matches!(self, Error::Driver { .. })
    }

    /// Check if this is a caller configuration or usage fault
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedBinding { .. }
                | Error::UnresolvableProjection { .. }
                | Error::NoMoreOutputs
                | Error::CursorConsumed
                | Error::DataConversion { .. }
        )
    }
}
