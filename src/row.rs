//! Row data handling for call results
//!
//! This module provides types for:
//! - Representing column and parameter values in a type-safe manner
//! - Representing one materialized row as an ordered tuple of values
//! - Referencing a nested result set returned as a row value
//!
//! Rows are produced by the extractor in [`crate::extract`]; drivers produce
//! the raw [`Value`]s through the [`ResultSource`](crate::call::ResultSource)
//! trait.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::call::ResultSource;
use crate::error::{Error, Result};

/// Represents a single column or parameter value.
///
/// This enum covers the data types a call can return. Values can be accessed
/// using the various `as_*` methods.
///
/// # Example
///
/// ```rust
/// use procall::Value;
///
/// fn process_value(value: &Value) {
///     match value {
///         Value::Null => println!("NULL"),
///         Value::Text(s) => println!("Text: {}", s),
///         Value::Integer(i) => println!("Integer: {}", i),
///         Value::Float(f) => println!("Float: {}", f),
///         _ => println!("Other type"),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Character data
    Text(String),
    /// Raw binary data
    Binary(Vec<u8>),
    /// JSON document
    Json(serde_json::Value),
    /// A nested result set returned as a value (a ref cursor); consumable
    /// exactly once
    Cursor(CursorHandle),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Try to get as an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Try to get as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get as a JSON document
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Try to get as a nested cursor
    pub fn as_cursor(&self) -> Option<&CursorHandle> {
        match self {
            Value::Cursor(c) => Some(c),
            _ => None,
        }
    }
}

/// A single materialized row: an ordered tuple of values as resolved by the
/// configured result shape, with any in/out parameter values appended last.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a new row with values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get the number of values in this row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by position
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get all values as a slice
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the row and return the values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Try to get a string value by position
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Try to get an integer value by position
    pub fn get_i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Value::as_i64)
    }

    /// Try to get a float value by position
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(Value::as_f64)
    }

    /// Check if a value is NULL (or the position is out of range)
    pub fn is_null(&self, index: usize) -> bool {
        self.get(index).map(Value::is_null).unwrap_or(true)
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// A reference to a nested result set returned as a row value.
///
/// Drivers that represent a function-returned cursor as a one-row,
/// one-column result wrap the inner result set in one of these. The
/// underlying source is forward-only and can be taken exactly once;
/// clones share the same consumption state.
#[derive(Clone)]
pub struct CursorHandle {
    source: Rc<RefCell<Option<Box<dyn ResultSource>>>>,
}

impl CursorHandle {
    /// Wrap a driver result set as a nested cursor value
    pub fn new(source: Box<dyn ResultSource>) -> Self {
        Self {
            source: Rc::new(RefCell::new(Some(source))),
        }
    }

    /// Take the underlying result set, consuming the cursor.
    ///
    /// Fails with [`Error::CursorConsumed`] on a second take.
    pub fn take(&self) -> Result<Box<dyn ResultSource>> {
        self.source.borrow_mut().take().ok_or(Error::CursorConsumed)
    }

    /// Check if the underlying result set has already been taken
    pub fn is_consumed(&self) -> bool {
        self.source.borrow().is_none()
    }
}

impl fmt::Debug for CursorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorHandle")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

impl PartialEq for CursorHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    struct EmptySource;

    impl ResultSource for EmptySource {
        fn column_count(&self) -> usize {
            0
        }

        fn next_row(&mut self) -> std::result::Result<bool, DriverError> {
            Ok(false)
        }

        fn value_at(&mut self, _position: usize) -> std::result::Result<Value, DriverError> {
            Ok(Value::Null)
        }

        fn close(&mut self) -> std::result::Result<(), DriverError> {
            Ok(())
        }
    }

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Integer(7).as_i64(), Some(7));
        assert_eq!(Value::Float(1.5).as_i64(), Some(1));
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Value::Text("abc".to_string()).as_str(), Some("abc"));
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(0).as_bool(), Some(false));
        assert_eq!(Value::Text("hi".to_string()).as_bytes(), Some(&b"hi"[..]));
        assert!(Value::Text("x".to_string()).as_i64().is_none());
    }

    #[test]
    fn test_row_access() {
        let row = Row::new(vec![
            Value::Integer(1),
            Value::Text("alice".to_string()),
            Value::Null,
        ]);
        assert_eq!(row.len(), 3);
        assert_eq!(row.get_i64(0), Some(1));
        assert_eq!(row.get_string(1), Some("alice"));
        assert!(row.is_null(2));
        assert!(row.is_null(99));
        assert_eq!(row[0], Value::Integer(1));
    }

    #[test]
    fn test_cursor_handle_consumed_once() {
        let handle = CursorHandle::new(Box::new(EmptySource));
        assert!(!handle.is_consumed());

        let clone = handle.clone();
        assert!(handle.take().is_ok());
        assert!(handle.is_consumed());
        assert!(clone.is_consumed());

        match clone.take() {
            Err(Error::CursorConsumed) => {}
            other => panic!("expected CursorConsumed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_cursor_handle_equality_is_identity() {
        let a = CursorHandle::new(Box::new(EmptySource));
        let b = CursorHandle::new(Box::new(EmptySource));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
