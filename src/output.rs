//! Output value types
//!
//! One position in a call's output sequence materializes into exactly one
//! [`Output`]: a result set, an update count, or - at the terminal position
//! of procedure and function calls - the out-parameter values or the
//! function return. Outputs are immutable once constructed; callers
//! distinguish variants with [`Output::is_result_set`] and the `as_*`
//! accessors rather than relying on identity.

use std::cell::{OnceCell, RefCell};
use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::row::{Row, Value};

/// Deferred producer of a row sequence; runs at most once
type RowProducer = Box<dyn FnOnce() -> Result<Vec<Row>>>;

/// The payload of one position in a call's output sequence
pub enum Output {
    /// A materialized result set
    ResultSet(ResultSetOutput),
    /// An update count
    UpdateCount(UpdateCountOutput),
    /// Post-call OUT/INOUT parameter values (stored procedures)
    Parameters(ParameterOutput),
    /// The call's return value (stored functions)
    FunctionReturn(FunctionReturnOutput),
}

impl Output {
    /// Check if this output is a result set
    pub fn is_result_set(&self) -> bool {
        matches!(self, Output::ResultSet(_))
    }

    /// Try to get as a result-set output
    pub fn as_result_set(&self) -> Option<&ResultSetOutput> {
        match self {
            Output::ResultSet(o) => Some(o),
            _ => None,
        }
    }

    /// Try to get as an update-count output
    pub fn as_update_count(&self) -> Option<&UpdateCountOutput> {
        match self {
            Output::UpdateCount(o) => Some(o),
            _ => None,
        }
    }

    /// Try to get as a parameter output
    pub fn as_parameters(&self) -> Option<&ParameterOutput> {
        match self {
            Output::Parameters(o) => Some(o),
            _ => None,
        }
    }

    /// Try to get as a function-return output
    pub fn as_function_return(&self) -> Option<&FunctionReturnOutput> {
        match self {
            Output::FunctionReturn(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::ResultSet(o) => f.debug_tuple("ResultSet").field(o).finish(),
            Output::UpdateCount(o) => f.debug_tuple("UpdateCount").field(o).finish(),
            Output::Parameters(o) => f.debug_tuple("Parameters").field(o).finish(),
            Output::FunctionReturn(o) => f.debug_tuple("FunctionReturn").field(o).finish(),
        }
    }
}

/// An ordered row sequence, materialized eagerly or on first access.
///
/// The deferred form holds a producer that runs at most once; its rows are
/// cached, and a second access after a failed production reports the
/// underlying cursor as consumed.
pub struct ResultSetOutput {
    rows: OnceCell<Vec<Row>>,
    producer: RefCell<Option<RowProducer>>,
}

impl ResultSetOutput {
    /// Create an output over already-materialized rows
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: OnceCell::from(rows),
            producer: RefCell::new(None),
        }
    }

    /// Create an output whose rows are produced on first access
    pub fn deferred(producer: impl FnOnce() -> Result<Vec<Row>> + 'static) -> Self {
        Self {
            rows: OnceCell::new(),
            producer: RefCell::new(Some(Box::new(producer))),
        }
    }

    /// The row sequence, producing it first if deferred
    pub fn rows(&self) -> Result<&[Row]> {
        if let Some(rows) = self.rows.get() {
            return Ok(rows);
        }
        let producer = self
            .producer
            .borrow_mut()
            .take()
            .ok_or(Error::CursorConsumed)?;
        let rows = producer()?;
        Ok(self.rows.get_or_init(|| rows))
    }

    /// Check if the rows have been materialized yet
    pub fn is_materialized(&self) -> bool {
        self.rows.get().is_some()
    }
}

impl fmt::Debug for ResultSetOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rows.get() {
            Some(rows) => f.debug_struct("ResultSetOutput").field("rows", rows).finish(),
            None => f
                .debug_struct("ResultSetOutput")
                .field("rows", &"<deferred>")
                .finish(),
        }
    }
}

/// A non-negative count of rows affected at one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCountOutput {
    count: u64,
}

impl UpdateCountOutput {
    /// Create an update-count output
    pub fn new(count: u64) -> Self {
        Self { count }
    }

    /// The number of rows affected
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Post-call OUT/INOUT parameter values, keyed by parameter name in
/// declaration order
#[derive(Debug, Clone, Default)]
pub struct ParameterOutput {
    values: IndexMap<String, Value>,
}

impl ParameterOutput {
    /// Create a parameter output over resolved values
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// Get a parameter value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Try to get a string parameter value by name
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Try to get an integer parameter value by name
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Number of captured parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no parameters were captured
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// A stored function's return value
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionReturnOutput {
    value: Value,
}

impl FunctionReturnOutput {
    /// Create a function-return output
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The return value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the output and return the value
    pub fn into_value(self) -> Value {
        self.value
    }
}
