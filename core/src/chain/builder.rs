// baton/src/chain/builder.rs

//! Turns a declared sequence of steps into a runnable [`Chain`].
//!
//! Declaration order is execution order. `build` walks the declarations back
//! to front, starting from the terminal no-op step, and for each declaration
//! constructs the step around the successor built so far. Every failure here is
//! a [`ConfigError`] returned to the caller; nothing is contained.

use crate::chain::catalog::StepCatalog;
use crate::chain::descriptor::{Args, ChainStep, Constructor, Param, StepDescriptor};
use crate::chain::registry::Resolver;
use crate::config::ChainConfig;
use crate::core::context::Context;
use crate::error::{panic_message, ConfigError, ConfigResult};
use crate::step::contract::{Next, Step};
use std::any::{Any, TypeId};
use std::cmp::Reverse;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Declares steps and wires them into a [`Chain`].
pub struct ChainBuilder {
  resolver: Arc<dyn Resolver>,
  catalog: Option<StepCatalog>,
  declared: Vec<StepDescriptor>,
}

impl ChainBuilder {
  /// Creates a builder resolving constructor services through `resolver`.
  pub fn new(resolver: impl Resolver + 'static) -> Self {
    Self {
      resolver: Arc::new(resolver),
      catalog: None,
      declared: Vec::new(),
    }
  }

  /// Supplies the catalog used by [`ChainBuilder::add_named`].
  pub fn with_catalog(mut self, catalog: StepCatalog) -> Self {
    self.catalog = Some(catalog);
    self
  }

  /// Declares a typed step. Its invocation contract is checked at compile time.
  pub fn add<S: ChainStep>(&mut self) -> ConfigResult<&mut Self> {
    self.add_descriptor(S::descriptor())
  }

  /// Declares a step from its descriptor.
  pub fn add_descriptor(&mut self, descriptor: StepDescriptor) -> ConfigResult<&mut Self> {
    check_declarable(&descriptor)?;
    self.push(descriptor);
    Ok(self)
  }

  /// Declares a step registered in the catalog under `name`.
  pub fn add_named(&mut self, name: &str) -> ConfigResult<&mut Self> {
    let descriptor = self.lookup(name)?;
    self.push(descriptor);
    Ok(self)
  }

  /// Declares every step listed in `config`, in order. All names are resolved
  /// before any is declared, so on error the builder is left untouched.
  pub fn add_config(&mut self, config: &ChainConfig) -> ConfigResult<&mut Self> {
    event!(Level::DEBUG, chain = %config.name, steps = config.steps.len(), "Declaring steps from configuration.");
    let descriptors = config
      .steps
      .iter()
      .map(|name| self.lookup(name))
      .collect::<ConfigResult<Vec<_>>>()?;
    for descriptor in descriptors {
      self.push(descriptor);
    }
    Ok(self)
  }

  fn lookup(&self, name: &str) -> ConfigResult<StepDescriptor> {
    if name.is_empty() {
      return Err(ConfigError::EmptyStepName);
    }
    let descriptor = self
      .catalog
      .as_ref()
      .and_then(|catalog| catalog.get(name))
      .cloned()
      .ok_or_else(|| ConfigError::UnknownStep { step: name.to_string() })?;
    check_declarable(&descriptor)?;
    Ok(descriptor)
  }

  fn push(&mut self, descriptor: StepDescriptor) {
    event!(Level::DEBUG, step = %descriptor.name(), position = self.declared.len(), "Step declared.");
    self.declared.push(descriptor);
  }

  /// Names of the declared steps, in declaration order.
  pub fn declared(&self) -> Vec<&str> {
    self.declared.iter().map(StepDescriptor::name).collect()
  }

  /// Constructs every declared step and links them into a chain.
  #[instrument(
    name = "ChainBuilder::build",
    skip_all,
    fields(num_steps = self.declared.len()),
    err(Display)
  )]
  pub fn build(&self) -> ConfigResult<Chain> {
    let mut pending: Vec<&StepDescriptor> = self.declared.iter().collect();
    let mut next = Next::terminal();

    while let Some(descriptor) = pending.pop() {
      let step = self.construct(descriptor, &next)?;
      next = Next::from_boxed(step);
    }

    event!(Level::DEBUG, "Chain built.");
    Ok(Chain {
      head: next,
      steps: self.declared.iter().map(|d| d.name().to_string()).collect(),
    })
  }

  fn construct(&self, descriptor: &StepDescriptor, next: &Next) -> ConfigResult<Box<dyn Step>> {
    let step_name = descriptor.name();

    // Richest constructors first; the stable sort keeps declaration order among equals.
    let mut candidates: Vec<&Constructor> = descriptor.constructors().iter().collect();
    candidates.sort_by_key(|ctor| Reverse(ctor.arity()));

    if !candidates.iter().any(|ctor| ctor.takes_next()) {
      event!(Level::ERROR, step = %step_name, "No constructor accepts the next step.");
      return Err(ConfigError::NotChainable {
        step: step_name.to_string(),
      });
    }

    let mut attempts = Vec::new();
    for ctor in candidates {
      let args = match self.resolve_args(step_name, ctor, next) {
        Ok(args) => args,
        Err(unresolved) => {
          event!(Level::DEBUG, step = %step_name, signature = %ctor.signature(), unresolved, "Constructor skipped: unresolved service.");
          attempts.push(format!("{}: {} is not registered", ctor.signature(), unresolved));
          continue;
        }
      };

      match panic::catch_unwind(AssertUnwindSafe(|| ctor.construct(&args))) {
        Ok(Ok(step)) => {
          event!(Level::DEBUG, step = %step_name, signature = %ctor.signature(), "Step constructed.");
          return Ok(step);
        }
        Ok(Err(e)) => {
          event!(Level::DEBUG, step = %step_name, signature = %ctor.signature(), error = %e, "Constructor failed; trying next candidate.");
          attempts.push(format!("{}: {}", ctor.signature(), e));
        }
        Err(payload) => {
          let message = panic_message(payload.as_ref());
          event!(Level::WARN, step = %step_name, signature = %ctor.signature(), %message, "Constructor panicked; trying next candidate.");
          attempts.push(format!("{}: factory panicked: {}", ctor.signature(), message));
        }
      }
    }

    event!(Level::ERROR, step = %step_name, "No constructor could be satisfied.");
    Err(ConfigError::Unconstructible {
      step: step_name.to_string(),
      attempts,
    })
  }

  /// Binds `Next` params to `next` and resolves the rest by type. On failure,
  /// returns the type name of the first service the resolver did not know.
  fn resolve_args(&self, step_name: &str, ctor: &Constructor, next: &Next) -> Result<Args, &'static str> {
    let mut bound_next = None;
    let mut services: Vec<(TypeId, Arc<dyn Any + Send + Sync>)> = Vec::new();

    for param in ctor.params() {
      match *param {
        Param::Next => bound_next = Some(next.clone()),
        Param::Service { type_id, type_name } => {
          let instance = self.resolver.resolve_raw(type_id).ok_or(type_name)?;
          services.push((type_id, instance));
        }
      }
    }

    Ok(Args::new(step_name, bound_next, services))
  }
}

fn check_declarable(descriptor: &StepDescriptor) -> ConfigResult<()> {
  if descriptor.name().is_empty() {
    return Err(ConfigError::EmptyStepName);
  }
  if descriptor.constructors().is_empty() {
    return Err(ConfigError::NoConstructors {
      step: descriptor.name().to_string(),
    });
  }
  Ok(())
}

/// A built, immutable chain of steps.
///
/// Holds no per-invocation state, so one chain can serve any number of
/// contexts, concurrently if its steps' own dependencies allow it. Dropping the
/// chain drops every step and whatever resources they own.
#[derive(Debug, Clone)]
pub struct Chain {
  head: Next,
  steps: Vec<String>,
}

impl Chain {
  /// Runs the chain against `ctx`. Never fails: inspect `ctx.errors()` afterwards.
  #[instrument(name = "Chain::invoke", skip_all, fields(num_steps = self.steps.len()))]
  pub async fn invoke(&self, ctx: &mut Context) {
    event!(Level::DEBUG, "Chain invocation starting.");
    self.head.invoke(ctx).await;
    if ctx.is_success() {
      event!(Level::DEBUG, "Chain invocation completed.");
    } else {
      event!(
        Level::DEBUG,
        errors = ctx.errors().len(),
        halted_at = ctx.halted_at().unwrap_or("-"),
        "Chain invocation completed with recorded errors."
      );
    }
  }

  /// The first step, usable as the `next` of another chain's step.
  pub fn head(&self) -> &Next {
    &self.head
  }

  /// Names of the steps in execution order.
  pub fn step_names(&self) -> &[String] {
    &self.steps
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}
