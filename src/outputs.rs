//! The output-sequencing cursor
//!
//! A call against the database produces an ordered, heterogeneous sequence
//! of outputs - result sets, update counts, and terminal out-parameter or
//! function-return values - discoverable only by repeatedly probing the
//! driver "is there more, and what kind." [`OutputsCursor`] is the
//! forward-only state machine over that protocol: `execute` positions it on
//! the first output, `advance` steps it, `current` materializes (and
//! memoizes) the output at the current position, and `release` hands the
//! call handle back to the resource registry.
//!
//! # Example
//!
//! ```rust,ignore
//! use procall::{CallContext, CallKind, OutputsCursor};
//!
//! let context = CallContext::new(CallKind::Statement);
//! let mut cursor = OutputsCursor::new(handle, context, registry);
//!
//! cursor.execute()?;
//! while let Some(output) = cursor.current()? {
//!     if output.is_result_set() {
//!         // consume rows
//!     }
//!     if !cursor.advance()? {
//!         break;
//!     }
//! }
//! cursor.release()?;
//! ```

use std::rc::Rc;

use indexmap::IndexMap;

use crate::call::{CallContext, CallHandle, ResourceRegistry};
use crate::constants::{ScalarType, NO_UPDATE_COUNT};
use crate::error::{Error, Result};
use crate::extract::RowExtractor;
use crate::output::{FunctionReturnOutput, Output, ParameterOutput, ResultSetOutput, UpdateCountOutput};
use crate::row::Value;

/// One position in the driver's output sequence.
///
/// Computed once per position by probing the call handle; the corresponding
/// [`Output`] is built lazily on first read and cached, never recomputed.
#[derive(Debug)]
pub struct ReturnState {
    is_result_set: bool,
    update_count: i64,
    cached: Option<Output>,
}

impl ReturnState {
    fn new(is_result_set: bool, update_count: i64) -> Self {
        Self {
            is_result_set,
            update_count,
            cached: None,
        }
    }

    /// Check if this position is a result set
    pub fn is_result_set(&self) -> bool {
        self.is_result_set
    }

    /// Raw update count at this position; negative when the position does
    /// not carry one
    pub fn update_count(&self) -> i64 {
        self.update_count
    }

    /// Check if this position itself carries a consumable output (a result
    /// set or a non-negative update count)
    pub fn indicates_more_outputs(&self) -> bool {
        self.is_result_set || self.update_count >= 0
    }

    /// Check if the output for this position has been built yet
    pub fn is_materialized(&self) -> bool {
        self.cached.is_some()
    }
}

/// Forward-only cursor over the outputs of one call handle.
///
/// The cursor owns its handle exclusively and must be driven by a single
/// control thread; it is not safe for concurrent access. Positions advance
/// monotonically and never rewind; once exhausted, the cursor stays
/// exhausted. Releasing the handle is the caller's responsibility via
/// [`OutputsCursor::release`], which is safe from any position.
pub struct OutputsCursor {
    call: Box<dyn CallHandle>,
    registry: Box<dyn ResourceRegistry>,
    context: Rc<CallContext>,
    extractor: RowExtractor,
    state: Option<ReturnState>,
    released: bool,
}

impl OutputsCursor {
    /// Create a cursor over a prepared call handle
    pub fn new(
        call: Box<dyn CallHandle>,
        context: CallContext,
        registry: Box<dyn ResourceRegistry>,
    ) -> Self {
        let context = Rc::new(context);
        let extractor = RowExtractor::new(Rc::clone(&context), call.describe());
        Self {
            call,
            registry,
            context,
            extractor,
            state: None,
            released: false,
        }
    }

    /// Run the call once and position the cursor on its first output.
    ///
    /// If the first outcome is not a result set, the update count is probed
    /// immediately; a call producing neither leaves the cursor effectively
    /// exhausted at position 0.
    pub fn execute(&mut self) -> Result<()> {
        let is_result_set = self
            .call
            .execute()
            .map_err(|e| Error::driver("execute", self.call.describe(), e))?;
        self.state = Some(self.build_return_state(is_result_set)?);
        Ok(())
    }

    fn build_return_state(&mut self, is_result_set: bool) -> Result<ReturnState> {
        let mut update_count = NO_UPDATE_COUNT;
        if !is_result_set {
            update_count = self
                .call
                .update_count()
                .map_err(|e| Error::driver("update_count", self.call.describe(), e))?;
        }
        Ok(ReturnState::new(is_result_set, update_count))
    }

    /// The output at the current position, materializing it on first read.
    ///
    /// Returns `None` before `execute()` and at an exhausted position whose
    /// call kind supplies no terminal output. The built output is cached on
    /// the current [`ReturnState`]; repeated reads at one position return
    /// the same output without touching the driver again.
    pub fn current(&mut self) -> Result<Option<&Output>> {
        let Self {
            call,
            context,
            extractor,
            state,
            ..
        } = self;
        let Some(state) = state.as_mut() else {
            return Ok(None);
        };
        if state.cached.is_none() {
            let built = Self::build_output(
                state.is_result_set,
                state.update_count,
                call.as_mut(),
                context,
                extractor,
            );
            match built {
                Ok(output) => state.cached = Some(output),
                // steady-state end of sequence, already reported by advance()
                Err(Error::NoMoreOutputs) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
        Ok(state.cached.as_ref())
    }

    /// Step to the next position.
    ///
    /// Returns false without touching the driver when the cursor was never
    /// started or the current position already indicates exhaustion.
    /// Otherwise the driver is asked for the next result and the return
    /// value answers "is the position I just moved to itself consumable" -
    /// not "did the move succeed." A true return guarantees `current()`
    /// yields a value.
    pub fn advance(&mut self) -> Result<bool> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };

        if state.indicates_more_outputs() {
            // prepare the next return state
            let is_result_set = self
                .call
                .more_results()
                .map_err(|e| Error::driver("more_results", self.call.describe(), e))?;
            self.state = Some(self.build_return_state(is_result_set)?);
        }

        Ok(self
            .state
            .as_ref()
            .map(ReturnState::indicates_more_outputs)
            .unwrap_or(false))
    }

    /// Release the call handle through the resource registry.
    ///
    /// Safe to call from any position, including before `execute()` and
    /// after exhaustion; the handle is released exactly once even if this
    /// is invoked repeatedly.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.registry
            .release(self.call.as_mut())
            .map_err(|e| Error::driver("release", self.call.describe(), e))?;
        self.released = true;
        Ok(())
    }

    /// The current return state, if the cursor has been started
    pub fn state(&self) -> Option<&ReturnState> {
        self.state.as_ref()
    }

    /// Check if the handle has been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Build the output for the current position. Evaluated once per
    /// position; the caller caches the result.
    fn build_output(
        is_result_set: bool,
        update_count: i64,
        call: &mut dyn CallHandle,
        context: &Rc<CallContext>,
        extractor: &RowExtractor,
    ) -> Result<Output> {
        tracing::debug!(
            is_result_set,
            update_count,
            kind = ?context.kind(),
            "building output"
        );

        if is_result_set {
            let source = call
                .result_set()
                .map_err(|e| Error::driver("result_set", call.describe(), e))?;
            let rows = extractor.extract(source)?;
            return Ok(Output::ResultSet(ResultSetOutput::new(rows)));
        }
        if update_count >= 0 {
            return Ok(Output::UpdateCount(UpdateCountOutput::new(
                update_count as u64,
            )));
        }
        if context.kind().defines_parameter_returns() {
            return Self::build_parameter_output(call, context);
        }
        if context.kind().defines_function_return() {
            return Self::build_function_return(call, context, extractor);
        }

        Err(Error::NoMoreOutputs)
    }

    /// Terminal output for stored procedures: read back every OUT/INOUT
    /// parameter, keyed by name in declaration order
    fn build_parameter_output(
        call: &mut dyn CallHandle,
        context: &Rc<CallContext>,
    ) -> Result<Output> {
        let mut values = IndexMap::new();
        for (index, binding) in context.bindings().iter().enumerate() {
            if !binding.direction().is_output() {
                continue;
            }
            let value = call
                .out_value(index)
                .map_err(|e| Error::driver("out_value", call.describe(), e))?;
            values.insert(binding.name().to_string(), value);
        }
        Ok(Output::Parameters(ParameterOutput::new(values)))
    }

    /// Terminal output for stored functions: read the return slot. A
    /// declared cursor return is unwrapped into a deferred result-set
    /// output whose rows are extracted on first access.
    fn build_function_return(
        call: &mut dyn CallHandle,
        context: &Rc<CallContext>,
        extractor: &RowExtractor,
    ) -> Result<Output> {
        let value = call
            .out_value(0)
            .map_err(|e| Error::driver("out_value", call.describe(), e))?;

        if context.shape().returns_cursor() {
            return match value {
                Value::Cursor(handle) => {
                    let extractor = extractor.clone();
                    Ok(Output::ResultSet(ResultSetOutput::deferred(move || {
                        let nested = handle.take()?;
                        extractor.extract(nested)
                    })))
                }
                _ => Err(Error::DataConversion {
                    position: 0,
                    declared: ScalarType::Cursor,
                }),
            };
        }

        Ok(Output::FunctionReturn(FunctionReturnOutput::new(value)))
    }
}
