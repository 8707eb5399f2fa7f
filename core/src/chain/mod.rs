// baton/src/chain/mod.rs

//! Design-time wiring: describing steps, resolving their dependencies, and
//! building them into a [`Chain`].

pub mod builder;
pub mod catalog;
pub mod descriptor;
pub mod registry;

pub use builder::{Chain, ChainBuilder};
pub use catalog::StepCatalog;
pub use descriptor::{Args, ChainStep, Constructor, Param, StepDescriptor};
pub use registry::{EmptyResolver, Resolver, ServiceRegistry};
