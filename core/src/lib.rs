// baton/src/lib.rs

//! Baton: an asynchronous chain-of-responsibility engine for Rust.
//!
//! A chain is an ordered sequence of independently written steps that all
//! operate on one shared, mutable [`Context`]. Each step decides whether to hand
//! the request on to the next step, and failures deep in the chain become
//! recorded diagnostics instead of unwinding work that already completed:
//!  - Steps implement [`StepLogic`] and are wrapped by [`contain`], which records
//!    any error or panic in `Context::errors` and returns normally.
//!  - [`ScopedStep`]s install temporary context items for downstream steps and
//!    always restore the previous items afterwards.
//!  - [`ChainBuilder`] resolves each step's constructor dependencies from a
//!    [`Resolver`] (such as [`ServiceRegistry`]) and wires the steps back to
//!    front, so declaration order is execution order.

pub mod chain;
pub mod config;
pub mod core;
pub mod error;
pub mod step;

// --- Re-exports for the Public API ---

pub use crate::core::context::{Context, Errors, StepFault};
pub use crate::core::items::{Entry, Items};
pub use crate::core::keys;

pub use crate::step::contract::{contain, Contained, Next, Step, StepLogic, Terminal};
pub use crate::step::func::FnStep;
pub use crate::step::scoped::{Scoped, ScopedStep, Snapshot};

pub use crate::chain::builder::{Chain, ChainBuilder};
pub use crate::chain::catalog::StepCatalog;
pub use crate::chain::descriptor::{Args, ChainStep, Constructor, Param, StepDescriptor};
pub use crate::chain::registry::{EmptyResolver, Resolver, ServiceRegistry};

pub use crate::config::ChainConfig;
pub use crate::error::{ConfigError, ConfigResult, StepError, StepResult};

// Step logic, constructor factories and closure steps all need these.
pub use async_trait::async_trait;
pub use futures::future::BoxFuture;

/*
    Core Workflow:
    1. Write each step as a struct holding its `Next` plus whatever it needs,
       implement `StepLogic` (or `ScopedStep`), and call `self.next.invoke(ctx)`
       where the request should be forwarded.
    2. Describe how it is built with `ChainStep::descriptor()` or a
       `StepDescriptor` of `Constructor`s.
    3. Register shared services (clients, options) in a `ServiceRegistry`.
    4. Declare the steps on a `ChainBuilder` in execution order and `build()`.
    5. Per request, create a `Context`, fill its items, `chain.invoke(&mut ctx).await`,
       then check `ctx.errors()`.
*/
