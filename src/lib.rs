#![warn(missing_docs)]

//! # procall
//!
//! Forward-only output sequencing for stored procedure and function calls
//! over SQL drivers.
//!
//! Executing a stored procedure through a driver's call handle produces a
//! heterogeneous, interleaved sequence of outputs - result sets, update
//! counts, and out-parameter values - discoverable only by repeatedly asking
//! the driver "is there more, and what kind." This crate implements the
//! state machine that walks that sequence and materializes each position
//! into a uniform [`Output`] value, independent of any particular driver.
//!
//! ## Features
//!
//! - **Driver-neutral** - drivers plug in through three small traits
//!   ([`CallHandle`], [`ResultSource`], [`ResourceRegistry`])
//! - **Forward-only, memoized** - each position is probed once and its
//!   output built at most once, on first read
//! - **Ref-cursor unnesting** - a function-returned cursor wrapped in a
//!   one-row, one-column result is flattened into its inner rows
//! - **In/out parameter projection** - post-call in/out parameter values are
//!   appended to each row after its declared columns
//! - **Leak-safe extraction** - three-stage teardown runs on every exit
//!   path, so a mid-extraction failure cannot leak a driver-held cursor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use procall::{CallContext, CallKind, OutputsCursor};
//!
//! // `handle` and `registry` come from your driver integration
//! let context = CallContext::new(CallKind::Procedure);
//! let mut cursor = OutputsCursor::new(handle, context, registry);
//!
//! cursor.execute()?;
//! while let Some(output) = cursor.current()? {
//!     if let Some(result_set) = output.as_result_set() {
//!         for row in result_set.rows()? {
//!             println!("{:?}", row);
//!         }
//!     } else if let Some(update) = output.as_update_count() {
//!         println!("rows affected: {}", update.count());
//!     }
//!     if !cursor.advance()? {
//!         break;
//!     }
//! }
//! cursor.release()?;
//! ```
//!
//! ## Advancing
//!
//! [`OutputsCursor::advance`] returns whether the position it just moved to
//! is itself consumable, not whether the move succeeded: a `true` return
//! guarantees the next [`OutputsCursor::current`] yields a value, and a
//! `false` return is permanent - the cursor never resurrects.
//!
//! ## Declared shapes and types
//!
//! Callers may declare the result shape up front ([`ResultShape`]); declared
//! projections and in/out parameters are decoded through scalar descriptors
//! resolved from the active [`TypeRegistry`]. With no declared projections,
//! every natural column is passed through as the driver produced it.

pub mod call;
pub mod constants;
pub mod error;
pub mod extract;
pub mod output;
pub mod outputs;
pub mod row;
pub mod types;

// Re-export commonly used types
pub use call::{
    CallContext, CallHandle, CallKind, ParamBinding, Projection, ResourceRegistry, ResultShape,
    ResultSource,
};
pub use constants::{BindDirection, ScalarType, NO_UPDATE_COUNT};
pub use error::{DriverError, Error, Result};
pub use extract::RowExtractor;
pub use output::{
    FunctionReturnOutput, Output, ParameterOutput, ResultSetOutput, UpdateCountOutput,
};
pub use outputs::{OutputsCursor, ReturnState};
pub use row::{CursorHandle, Row, Value};
pub use types::{ScalarDescriptor, TypeRegistry};

// Re-export serde_json for users working with JSON values
pub use serde_json;
