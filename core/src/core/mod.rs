pub mod context;
pub mod items;
pub mod keys;

pub use context::{Context, Errors, StepFault};
pub use items::{Entry, Items};
