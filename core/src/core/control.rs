// src/core/control.rs

//! Flow control signals and run outcomes.

/// Returned by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Keep going: next handler, then next step.
  Continue,
  /// Halt the run now. Remaining handlers and steps are not executed.
  Stop,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step was executed or legitimately skipped.
  Completed,
  /// A handler returned [`PipelineControl::Stop`].
  Stopped,
}
