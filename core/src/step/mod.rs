// baton/src/step/mod.rs

//! The step contract, its containment decorator, and the scoped-value and
//! closure specializations built on it.

pub mod contract;
pub mod func;
pub mod scoped;

pub use contract::{contain, Contained, Next, Step, StepLogic, Terminal};
pub use func::FnStep;
pub use scoped::{Scoped, ScopedStep, Snapshot};
