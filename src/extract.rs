//! Row extraction for a single driver result set
//!
//! Extraction turns one forward-only [`ResultSource`] into an ordered,
//! eagerly materialized sequence of [`Row`]s:
//!
//! 1. In/out parameter bindings are resolved through the type registry and
//!    registered as trailing projections, so each row carries the post-call
//!    parameter values after its declared columns.
//! 2. Rows are pulled one at a time through a [`RowDecoder`] until the
//!    driver cursor is exhausted.
//! 3. A function call with no explicit projections whose sole result is a
//!    single nested cursor value is unnested by recursively extracting the
//!    inner result set.
//! 4. Teardown runs in three stages on every exit path - decoder, per-call
//!    extraction state, then the values source holding the driver cursor -
//!    so a failure partway through cannot leak a driver-held cursor.

use std::rc::Rc;

use crate::call::{CallContext, ResultSource};
use crate::constants::BindDirection;
use crate::error::{Error, Result};
use crate::row::{CursorHandle, Row, Value};
use crate::types::ScalarDescriptor;

/// One column read performed for every row
#[derive(Debug, Clone, Copy)]
enum ColumnRead {
    /// Natural column, passed through undecoded
    Natural { position: usize },
    /// Declared column or trailing parameter, decoded through a descriptor
    Scalar {
        position: usize,
        descriptor: ScalarDescriptor,
    },
}

/// The row-reading abstraction: the resolved, per-extraction read plan
struct RowDecoder {
    reads: Vec<ColumnRead>,
}

impl RowDecoder {
    /// Resolve the read plan for one extraction.
    ///
    /// In/out parameter descriptors resolve first so a configuration fault
    /// surfaces before any row is read; their reads go last, after the
    /// declared projections (or, absent any, the source's natural columns).
    fn resolve(context: &CallContext, natural_width: usize) -> Result<Self> {
        let mut trailing = Vec::new();
        for binding in context.bindings() {
            if binding.direction() != BindDirection::InputOutput {
                continue;
            }
            let descriptor = context.registry().resolve(binding.declared()).ok_or_else(|| {
                Error::UnsupportedBinding {
                    parameter: binding.name().to_string(),
                    declared: binding.declared(),
                }
            })?;
            trailing.push(descriptor);
        }

        let mut reads = Vec::new();
        if context.shape().has_explicit_projections() {
            for projection in context.shape().projections() {
                let descriptor =
                    context.registry().resolve(projection.declared()).ok_or_else(|| {
                        Error::UnresolvableProjection {
                            label: projection.label().to_string(),
                            declared: projection.declared(),
                        }
                    })?;
                reads.push(ColumnRead::Scalar {
                    position: reads.len(),
                    descriptor,
                });
            }
        } else {
            for position in 0..natural_width {
                reads.push(ColumnRead::Natural { position });
            }
        }
        for descriptor in trailing {
            reads.push(ColumnRead::Scalar {
                position: reads.len(),
                descriptor,
            });
        }

        Ok(Self { reads })
    }

    /// Decode the current row of the source into an ordered tuple
    fn decode_row(&self, values: &mut ValuesSource) -> Result<Row> {
        let mut decoded = Vec::with_capacity(self.reads.len());
        for read in &self.reads {
            let value = match *read {
                ColumnRead::Natural { position } => values.value_at(position)?,
                ColumnRead::Scalar {
                    position,
                    descriptor,
                } => descriptor.coerce(position, values.value_at(position)?)?,
            };
            decoded.push(value);
        }
        Ok(Row::new(decoded))
    }

    /// First teardown stage: finalize the read plan
    fn finish(&mut self) -> Result<()> {
        self.reads.clear();
        Ok(())
    }
}

/// Per-call processing state for one extraction
struct ExtractionState {
    rows_read: usize,
}

impl ExtractionState {
    fn new() -> Self {
        Self { rows_read: 0 }
    }

    fn row_finished(&mut self) {
        self.rows_read += 1;
    }

    /// Second teardown stage: finalize the per-call state
    fn finish(&mut self) -> Result<()> {
        tracing::trace!(rows = self.rows_read, "extraction finished");
        Ok(())
    }
}

/// Teardown-owning wrapper around the driver result set, mapping driver
/// faults into wrapped errors carrying the call's diagnostic form
struct ValuesSource {
    source: Box<dyn ResultSource>,
    statement: String,
    closed: bool,
}

impl ValuesSource {
    fn new(source: Box<dyn ResultSource>, statement: String) -> Self {
        Self {
            source,
            statement,
            closed: false,
        }
    }

    fn next_row(&mut self) -> Result<bool> {
        self.source
            .next_row()
            .map_err(|e| Error::driver("next_row", self.statement.clone(), e))
    }

    fn value_at(&mut self, position: usize) -> Result<Value> {
        self.source
            .value_at(position)
            .map_err(|e| Error::driver("value_at", self.statement.clone(), e))
    }

    /// Third teardown stage: release the driver-held cursor
    fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.source
            .close()
            .map_err(|e| Error::driver("close", self.statement.clone(), e))
    }
}

/// Turns a single driver result set into an ordered sequence of rows,
/// applying the declared result shape and in/out parameter projection, with
/// nested-cursor unnesting.
///
/// Extraction is all-or-nothing per position: a failure mid-sequence
/// discards the rows already materialized and surfaces the error.
#[derive(Clone)]
pub struct RowExtractor {
    context: Rc<CallContext>,
    statement: String,
}

impl RowExtractor {
    /// Create an extractor for one call; `statement` is the call handle's
    /// diagnostic form, used in wrapped driver errors
    pub fn new(context: Rc<CallContext>, statement: impl Into<String>) -> Self {
        Self {
            context,
            statement: statement.into(),
        }
    }

    /// Materialize every row of the source.
    ///
    /// The three teardown stages all run regardless of how the row loop
    /// exits; an extraction error takes precedence over a teardown error,
    /// which is then only logged.
    pub fn extract(&self, source: Box<dyn ResultSource>) -> Result<Vec<Row>> {
        let mut decoder = RowDecoder::resolve(&self.context, source.column_count())?;
        let mut state = ExtractionState::new();
        let mut values = ValuesSource::new(source, self.statement.clone());

        let outcome = self.pull_rows(&decoder, &mut state, &mut values);

        let mut teardown_error = None;
        for stage in [decoder.finish(), state.finish(), values.finish()] {
            if let Err(e) = stage {
                teardown_error.get_or_insert(e);
            }
        }

        match (outcome, teardown_error) {
            (Err(body), Some(teardown)) => {
                tracing::warn!(error = %teardown, "teardown failure after extraction error");
                Err(body)
            }
            (Err(body), None) => Err(body),
            (Ok(_), Some(teardown)) => Err(teardown),
            (Ok(rows), None) => Ok(rows),
        }
    }

    fn pull_rows(
        &self,
        decoder: &RowDecoder,
        state: &mut ExtractionState,
        values: &mut ValuesSource,
    ) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while values.next_row()? {
            rows.push(decoder.decode_row(values)?);
            state.row_finished();
        }

        if let Some(handle) = self.nested_cursor(&mut rows) {
            tracing::trace!("unnesting function-returned cursor");
            let nested = handle.take()?;
            return self.extract(nested);
        }

        Ok(rows)
    }

    /// Detect the ref-cursor unnesting case: a function call with a declared
    /// cursor return, no explicit projections, and exactly one row whose
    /// sole value is a nested result set. Consumes the row when it matches.
    fn nested_cursor(&self, rows: &mut Vec<Row>) -> Option<CursorHandle> {
        if self.context.shape().has_explicit_projections() {
            return None;
        }
        if !self.context.kind().defines_function_return() || !self.context.shape().returns_cursor()
        {
            return None;
        }
        let [row] = rows.as_slice() else {
            return None;
        };
        let [Value::Cursor(handle)] = row.values() else {
            return None;
        };
        let handle = handle.clone();
        rows.clear();
        Some(handle)
    }
}
