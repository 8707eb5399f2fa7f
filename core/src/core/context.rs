// baton/src/core/context.rs

//! Defines the per-request [`Context`] that flows through a chain by reference,
//! and the append-only [`Errors`] list that execution failures are recorded in.

use crate::core::items::Items;
use crate::error::{StepError, StepResult};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// One execution failure, recorded by the containment boundary of `step`.
#[derive(Debug)]
pub struct StepFault {
  pub step: String,
  pub error: StepError,
}

impl fmt::Display for StepFault {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.step, self.error)
  }
}

/// Append-only sequence of [`StepFault`]s. The engine never clears it.
#[derive(Debug, Default)]
pub struct Errors(Vec<StepFault>);

impl Errors {
  pub fn add(&mut self, step: impl Into<String>, error: StepError) {
    self.0.push(StepFault {
      step: step.into(),
      error,
    });
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, StepFault> {
    self.0.iter()
  }

  pub fn first(&self) -> Option<&StepFault> {
    self.0.first()
  }

  pub fn last(&self) -> Option<&StepFault> {
    self.0.last()
  }
}

impl<'a> IntoIterator for &'a Errors {
  type Item = &'a StepFault;
  type IntoIter = std::slice::Iter<'a, StepFault>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

/// Shared mutable state for one logical request.
///
/// Create one per request, pass it to `Chain::invoke` by `&mut`, and inspect
/// [`Context::errors`] afterwards: `invoke` never reports failure itself, so
/// `errors().is_empty()` (or [`Context::is_success`]) is the real success check.
#[derive(Debug, Default)]
pub struct Context {
  items: Items,
  errors: Errors,
  cancellation: CancellationToken,
  halted_at: Option<String>,
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a context observing an existing cancellation token.
  pub fn with_cancellation(cancellation: CancellationToken) -> Self {
    Self {
      cancellation,
      ..Self::default()
    }
  }

  pub fn items(&self) -> &Items {
    &self.items
  }

  pub fn items_mut(&mut self) -> &mut Items {
    &mut self.items
  }

  pub fn errors(&self) -> &Errors {
    &self.errors
  }

  /// Appends a failure without halting anything. Steps may use this for
  /// non-fatal diagnostics; containment boundaries go through [`Context::record_fault`].
  pub fn add_error(&mut self, step: impl Into<String>, error: StepError) {
    self.errors.add(step, error);
  }

  /// Records a fault contained at `step`'s boundary and marks the request halted.
  pub(crate) fn record_fault(&mut self, step: &str, error: StepError) {
    if self.halted_at.is_none() {
      self.halted_at = Some(step.to_string());
    }
    self.errors.add(step, error);
  }

  pub fn cancellation(&self) -> &CancellationToken {
    &self.cancellation
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancellation.is_cancelled()
  }

  /// `Err(StepError::Cancelled)` once cancellation has been requested.
  pub fn check_cancelled(&self) -> StepResult {
    if self.cancellation.is_cancelled() {
      Err(StepError::Cancelled)
    } else {
      Ok(())
    }
  }

  /// Name of the step whose boundary contained the first fault, if any.
  /// Steps downstream of it never ran.
  pub fn halted_at(&self) -> Option<&str> {
    self.halted_at.as_deref()
  }

  pub fn is_halted(&self) -> bool {
    self.halted_at.is_some()
  }

  pub fn is_success(&self) -> bool {
    self.errors.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_fault_keeps_first_halting_step() {
    let mut ctx = Context::new();
    assert!(ctx.is_success());
    assert!(!ctx.is_halted());

    ctx.record_fault("Inner", StepError::Cancelled);
    ctx.record_fault("Outer", StepError::validation("Outer", "bad input"));

    assert_eq!(ctx.halted_at(), Some("Inner"));
    assert_eq!(ctx.errors().len(), 2);
    assert_eq!(ctx.errors().first().unwrap().step, "Inner");
    assert_eq!(
      ctx.errors().last().unwrap().to_string(),
      "Outer: Validation failed in step 'Outer': bad input"
    );
  }

  #[test]
  fn add_error_does_not_halt() {
    let mut ctx = Context::new();
    ctx.add_error("Audit", StepError::Cancelled);
    assert!(!ctx.is_success());
    assert!(!ctx.is_halted());
  }

  #[test]
  fn check_cancelled_follows_token() {
    let token = CancellationToken::new();
    let ctx = Context::with_cancellation(token.clone());
    assert!(ctx.check_cancelled().is_ok());
    token.cancel();
    assert!(ctx.is_cancelled());
    assert!(matches!(ctx.check_cancelled(), Err(StepError::Cancelled)));
  }
}
