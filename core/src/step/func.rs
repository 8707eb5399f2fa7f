// baton/src/step/func.rs

//! Closure-backed steps, for logic too small to deserve its own type.

use crate::core::context::Context;
use crate::error::StepResult;
use crate::step::contract::{Next, StepLogic};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Signature of a closure step. The closure receives the context and the
/// successor and decides whether (and when) to call `next.invoke(ctx)`.
pub type StepFn = dyn for<'a> Fn(&'a mut Context, &'a Next) -> BoxFuture<'a, StepResult> + Send + Sync;

/// [`StepLogic`] implemented by a shared closure.
pub struct FnStep {
  name: String,
  next: Next,
  func: Arc<StepFn>,
}

impl FnStep {
  pub fn new<F>(name: impl Into<String>, next: Next, func: F) -> Self
  where
    F: for<'a> Fn(&'a mut Context, &'a Next) -> BoxFuture<'a, StepResult> + Send + Sync + 'static,
  {
    Self::from_shared(name, next, Arc::new(func))
  }

  pub(crate) fn from_shared(name: impl Into<String>, next: Next, func: Arc<StepFn>) -> Self {
    Self {
      name: name.into(),
      next,
      func,
    }
  }
}

#[async_trait]
impl StepLogic for FnStep {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    (self.func)(ctx, &self.next).await
  }

  fn name(&self) -> &str {
    &self.name
  }
}
