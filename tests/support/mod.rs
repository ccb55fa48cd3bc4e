//! Scripted in-memory driver used by the integration tests
//!
//! `ScriptedCall` plays back a fixed sequence of positions (result sets and
//! update counts), `ScriptedResults` serves canned rows with optional
//! injected faults, and `CountingRegistry` records releases. Shared
//! `Rc<Cell<_>>` counters let tests observe driver traffic after the
//! fakes have been boxed into the cursor.

#![allow(dead_code)]

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use procall::{CallHandle, DriverError, ResourceRegistry, ResultSource, Value};

/// Minimal error type for injected driver faults
#[derive(Debug)]
pub struct ScriptError(pub &'static str);

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for ScriptError {}

pub fn script_error(message: &'static str) -> DriverError {
    Box::new(ScriptError(message))
}

/// A canned result set with optional injected faults
pub struct ScriptedResults {
    columns: usize,
    rows: Vec<Vec<Value>>,
    next: usize,
    current: Option<usize>,
    closed: Rc<Cell<bool>>,
    pulls: Rc<Cell<usize>>,
    fail_at: Option<usize>,
    close_error: bool,
}

impl ScriptedResults {
    pub fn new(columns: usize, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            next: 0,
            current: None,
            closed: Rc::new(Cell::new(false)),
            pulls: Rc::new(Cell::new(0)),
            fail_at: None,
            close_error: false,
        }
    }

    /// Fail `next_row` when it would serve the row at `row` (zero-based)
    pub fn with_row_error_at(mut self, row: usize) -> Self {
        self.fail_at = Some(row);
        self
    }

    /// Fail `close`
    pub fn with_close_error(mut self) -> Self {
        self.close_error = true;
        self
    }

    /// Shared flag set once `close` has been called
    pub fn closed_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.closed)
    }

    /// Shared count of rows served
    pub fn pull_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.pulls)
    }
}

impl ResultSource for ScriptedResults {
    fn column_count(&self) -> usize {
        self.columns
    }

    fn next_row(&mut self) -> Result<bool, DriverError> {
        if self.fail_at == Some(self.next) {
            return Err(script_error("row read failed"));
        }
        if self.next < self.rows.len() {
            self.current = Some(self.next);
            self.next += 1;
            self.pulls.set(self.pulls.get() + 1);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn value_at(&mut self, position: usize) -> Result<Value, DriverError> {
        let row = self.current.ok_or_else(|| script_error("no current row"))?;
        self.rows
            .get(row)
            .and_then(|values| values.get(position))
            .cloned()
            .ok_or_else(|| script_error("position out of range"))
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.closed.set(true);
        if self.close_error {
            Err(script_error("close failed"))
        } else {
            Ok(())
        }
    }
}

enum Step {
    ResultSet(Option<Box<dyn ResultSource>>),
    UpdateCount(i64),
}

/// A call handle that plays back a fixed sequence of positions.
///
/// Positions past the end of the script report "no result set, update
/// count -1", the way a drained driver does.
pub struct ScriptedCall {
    steps: Vec<Step>,
    position: Option<usize>,
    out_values: Vec<Value>,
    executions: Rc<Cell<usize>>,
    result_set_requests: Rc<Cell<usize>>,
    execute_error: bool,
    more_results_error: bool,
}

impl ScriptedCall {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            position: None,
            out_values: Vec::new(),
            executions: Rc::new(Cell::new(0)),
            result_set_requests: Rc::new(Cell::new(0)),
            execute_error: false,
            more_results_error: false,
        }
    }

    pub fn then_results(mut self, results: ScriptedResults) -> Self {
        self.steps.push(Step::ResultSet(Some(Box::new(results))));
        self
    }

    pub fn then_update_count(mut self, count: i64) -> Self {
        self.steps.push(Step::UpdateCount(count));
        self
    }

    pub fn with_out_values(mut self, values: Vec<Value>) -> Self {
        self.out_values = values;
        self
    }

    pub fn with_execute_error(mut self) -> Self {
        self.execute_error = true;
        self
    }

    pub fn with_more_results_error(mut self) -> Self {
        self.more_results_error = true;
        self
    }

    /// Shared count of `execute` calls
    pub fn execution_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.executions)
    }

    /// Shared count of `result_set` calls (one per extraction)
    pub fn result_set_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.result_set_requests)
    }

    fn at_result_set(&self) -> bool {
        matches!(
            self.position.and_then(|p| self.steps.get(p)),
            Some(Step::ResultSet(_))
        )
    }
}

impl CallHandle for ScriptedCall {
    fn execute(&mut self) -> Result<bool, DriverError> {
        if self.execute_error {
            return Err(script_error("execute rejected"));
        }
        self.executions.set(self.executions.get() + 1);
        self.position = Some(0);
        Ok(self.at_result_set())
    }

    fn update_count(&mut self) -> Result<i64, DriverError> {
        match self.position.and_then(|p| self.steps.get(p)) {
            Some(Step::UpdateCount(count)) => Ok(*count),
            _ => Ok(-1),
        }
    }

    fn more_results(&mut self) -> Result<bool, DriverError> {
        if self.more_results_error {
            return Err(script_error("connection lost"));
        }
        let next = self.position.map(|p| p + 1).unwrap_or(0);
        self.position = Some(next);
        Ok(self.at_result_set())
    }

    fn result_set(&mut self) -> Result<Box<dyn ResultSource>, DriverError> {
        self.result_set_requests
            .set(self.result_set_requests.get() + 1);
        let position = self.position.ok_or_else(|| script_error("not executed"))?;
        match self.steps.get_mut(position) {
            Some(Step::ResultSet(slot)) => slot
                .take()
                .ok_or_else(|| script_error("result set already consumed")),
            _ => Err(script_error("position is not a result set")),
        }
    }

    fn out_value(&mut self, index: usize) -> Result<Value, DriverError> {
        self.out_values
            .get(index)
            .cloned()
            .ok_or_else(|| script_error("no out value at index"))
    }

    fn describe(&self) -> String {
        "{call scripted_proc(?)}".to_string()
    }
}

impl Default for ScriptedCall {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry that counts how many times the handle was released
pub struct CountingRegistry {
    releases: Rc<Cell<usize>>,
}

impl CountingRegistry {
    pub fn new() -> Self {
        Self {
            releases: Rc::new(Cell::new(0)),
        }
    }

    /// Shared release count
    pub fn release_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.releases)
    }
}

impl ResourceRegistry for CountingRegistry {
    fn release(&mut self, _handle: &mut dyn CallHandle) -> Result<(), DriverError> {
        self.releases.set(self.releases.get() + 1);
        Ok(())
    }
}

impl Default for CountingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
