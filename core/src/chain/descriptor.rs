// baton/src/chain/descriptor.rs

//! Explicit construction metadata for steps.
//!
//! A [`StepDescriptor`] lists the ways a step can be constructed. Each
//! [`Constructor`] declares its parameters up front (the next step and/or
//! services resolved by type) and carries a factory that receives the resolved
//! values through [`Args`]. The builder picks a constructor from this metadata
//! the same way it would by inspecting constructor signatures.

use crate::core::context::Context;
use crate::error::StepResult;
use crate::step::contract::{contain, Next, Step, StepLogic};
use crate::step::func::{FnStep, StepFn};
use crate::step::scoped::{Scoped, ScopedStep};
use anyhow::anyhow;
use futures::future::BoxFuture;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// One declared constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
  /// Bound to the step that follows in the chain.
  Next,
  /// Resolved from the registry by declared type.
  Service { type_id: TypeId, type_name: &'static str },
}

impl Param {
  pub fn service<T: Any>() -> Self {
    Param::Service {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
    }
  }
}

impl fmt::Display for Param {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Param::Next => f.write_str("next"),
      Param::Service { type_name, .. } => f.write_str(type_name),
    }
  }
}

/// Resolved constructor arguments handed to a factory.
pub struct Args {
  step: String,
  next: Option<Next>,
  services: Vec<(TypeId, Arc<dyn Any + Send + Sync>)>,
}

impl Args {
  pub(crate) fn new(step: &str, next: Option<Next>, services: Vec<(TypeId, Arc<dyn Any + Send + Sync>)>) -> Self {
    Self {
      step: step.to_string(),
      next,
      services,
    }
  }

  /// The successor, if this constructor declared [`Param::Next`].
  pub fn next(&self) -> anyhow::Result<Next> {
    self
      .next
      .clone()
      .ok_or_else(|| anyhow!("constructor of '{}' did not declare a next parameter", self.step))
  }

  /// A resolved service, if this constructor declared it.
  pub fn service<T: Any + Send + Sync>(&self) -> anyhow::Result<Arc<T>> {
    let type_id = TypeId::of::<T>();
    self
      .services
      .iter()
      .find(|(id, _)| *id == type_id)
      .and_then(|(_, instance)| instance.clone().downcast::<T>().ok())
      .ok_or_else(|| {
        anyhow!(
          "constructor of '{}' did not declare a {} parameter",
          self.step,
          std::any::type_name::<T>()
        )
      })
  }

  pub fn step_name(&self) -> &str {
    &self.step
  }
}

type Factory = dyn Fn(&Args) -> anyhow::Result<Box<dyn Step>> + Send + Sync;

/// A parameter list plus the factory that builds the step from it.
///
/// A factory that returns `Err` or panics counts as a failed attempt, and the
/// builder moves on to the next candidate.
#[derive(Clone)]
pub struct Constructor {
  params: Vec<Param>,
  factory: Arc<Factory>,
}

impl Constructor {
  /// A constructor producing any [`Step`]. The step is used as-is, so it is
  /// responsible for its own containment.
  pub fn new<S, F>(factory: F) -> Self
  where
    S: Step + 'static,
    F: Fn(&Args) -> anyhow::Result<S> + Send + Sync + 'static,
  {
    Self {
      params: Vec::new(),
      factory: Arc::new(move |args: &Args| -> anyhow::Result<Box<dyn Step>> { Ok(Box::new(factory(args)?)) }),
    }
  }

  /// A constructor producing [`StepLogic`], wrapped in a containment boundary.
  pub fn logic<L, F>(factory: F) -> Self
  where
    L: StepLogic + 'static,
    F: Fn(&Args) -> anyhow::Result<L> + Send + Sync + 'static,
  {
    Self::new(move |args: &Args| factory(args).map(contain))
  }

  /// A constructor producing a [`ScopedStep`], wrapped in [`Scoped`] and a
  /// containment boundary.
  pub fn scoped<S, F>(factory: F) -> Self
  where
    S: ScopedStep + 'static,
    F: Fn(&Args) -> anyhow::Result<S> + Send + Sync + 'static,
  {
    Self::new(move |args: &Args| factory(args).map(|step| contain(Scoped(step))))
  }

  /// Declares a parameter bound to the next step.
  pub fn with_next(mut self) -> Self {
    self.params.push(Param::Next);
    self
  }

  /// Declares a parameter resolved from the registry as `T`.
  pub fn with_service<T: Any + Send + Sync>(mut self) -> Self {
    self.params.push(Param::service::<T>());
    self
  }

  pub fn params(&self) -> &[Param] {
    &self.params
  }

  pub fn arity(&self) -> usize {
    self.params.len()
  }

  pub fn takes_next(&self) -> bool {
    self.params.contains(&Param::Next)
  }

  /// Human-readable signature, e.g. `(next, my_crate::Client)`.
  pub fn signature(&self) -> String {
    let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
    format!("({})", params.join(", "))
  }

  pub(crate) fn construct(&self, args: &Args) -> anyhow::Result<Box<dyn Step>> {
    (self.factory)(args)
  }
}

impl fmt::Debug for Constructor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Constructor").field("params", &self.params).finish()
  }
}

/// Everything the builder needs to know about one kind of step.
#[derive(Debug, Clone)]
pub struct StepDescriptor {
  name: String,
  constructors: Vec<Constructor>,
}

impl StepDescriptor {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      constructors: Vec::new(),
    }
  }

  pub fn constructor(mut self, constructor: Constructor) -> Self {
    self.constructors.push(constructor);
    self
  }

  /// Descriptor for a closure step with a single `(next)` constructor.
  pub fn from_fn<F>(name: impl Into<String>, func: F) -> Self
  where
    F: for<'a> Fn(&'a mut Context, &'a Next) -> BoxFuture<'a, StepResult> + Send + Sync + 'static,
  {
    let name = name.into();
    let func: Arc<StepFn> = Arc::new(func);
    let step_name = name.clone();
    Self::new(name).constructor(
      Constructor::logic(move |args: &Args| Ok(FnStep::from_shared(step_name.clone(), args.next()?, func.clone())))
        .with_next(),
    )
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn constructors(&self) -> &[Constructor] {
    &self.constructors
  }
}

/// A step type that knows how to describe its own construction.
///
/// Implementing this trait is what makes a type addable with
/// `ChainBuilder::add::<T>()`; the invocation signature is checked by the
/// compiler through the [`Step`]/[`StepLogic`] bounds of the constructors.
pub trait ChainStep: 'static {
  fn descriptor() -> StepDescriptor;
}
