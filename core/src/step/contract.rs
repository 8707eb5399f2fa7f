// baton/src/step/contract.rs

//! The step invocation protocol.
//!
//! A [`Step`] is what the chain calls; it never fails. Concrete steps supply a
//! fallible [`StepLogic`] and are passed through [`contain`], which produces the
//! [`Contained`] decorator: it runs the logic and, if the logic returns an error
//! or panics, records exactly one [`StepFault`](crate::core::StepFault) in the
//! context and returns normally. Ancestor steps therefore see their call to
//! [`Next::invoke`] complete as usual and still run their post-delegation code,
//! while the steps after the failing one never run.

use crate::core::context::Context;
use crate::error::{StepError, StepResult};
use async_trait::async_trait;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{event, span, Instrument, Level};

/// A unit of a chain. Implementations must not let failures escape `invoke`.
#[async_trait]
pub trait Step: Send + Sync {
  async fn invoke(&self, ctx: &mut Context);

  /// Name used in diagnostics and recorded faults.
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }
}

/// The fallible core of a step. Delegate downstream by calling
/// `self.next.invoke(ctx).await` at the point the request should be forwarded;
/// returning without doing so ends the chain here.
#[async_trait]
pub trait StepLogic: Send + Sync {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult;

  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }
}

/// Handle to the successor of a step. Cheap to clone; every clone invokes the
/// same step instance.
#[derive(Clone)]
pub struct Next(Arc<dyn Step>);

impl Next {
  pub fn new<S: Step + 'static>(step: S) -> Self {
    Next(Arc::new(step))
  }

  pub fn from_boxed(step: Box<dyn Step>) -> Self {
    Next(Arc::from(step))
  }

  /// The no-op step every chain ends with.
  pub fn terminal() -> Self {
    Next::new(Terminal)
  }

  pub async fn invoke(&self, ctx: &mut Context) {
    self.0.invoke(ctx).await
  }

  pub fn name(&self) -> &str {
    self.0.name()
  }
}

impl fmt::Debug for Next {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Next").field(&self.0.name()).finish()
  }
}

/// Completes immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct Terminal;

#[async_trait]
impl Step for Terminal {
  async fn invoke(&self, _ctx: &mut Context) {}

  fn name(&self) -> &str {
    "Terminal"
  }
}

/// Containment boundary around a [`StepLogic`].
pub struct Contained<L> {
  logic: L,
}

impl<L: StepLogic> Contained<L> {
  pub fn logic(&self) -> &L {
    &self.logic
  }
}

/// Wraps `logic` in a containment boundary so it can take part in a chain.
pub fn contain<L: StepLogic>(logic: L) -> Contained<L> {
  Contained { logic }
}

#[async_trait]
impl<L: StepLogic> Step for Contained<L> {
  async fn invoke(&self, ctx: &mut Context) {
    let step_name = self.logic.name();
    let step_span = span!(Level::DEBUG, "step", step = step_name);

    async move {
      event!(Level::TRACE, "Running step core.");
      let outcome = AssertUnwindSafe(self.logic.invoke_core(ctx)).catch_unwind().await;

      let error = match outcome {
        Ok(Ok(())) => {
          event!(Level::TRACE, "Step core completed.");
          return;
        }
        Ok(Err(e)) => e,
        Err(payload) => StepError::from_panic(payload),
      };

      event!(Level::WARN, error = %error, "Step failed; fault recorded and contained.");
      ctx.record_fault(step_name, error);
    }
    .instrument(step_span)
    .await
  }

  fn name(&self) -> &str {
    self.logic.name()
  }
}
