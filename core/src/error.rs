// baton/src/error.rs

//! The two disjoint error classes of the engine.
//!
//! [`ConfigError`] is raised while declaring and building a chain and always
//! propagates to the caller of `ChainBuilder::build`. [`StepError`] is raised
//! while a step's core logic runs and is always caught at that step's
//! containment boundary and recorded in the context.

use anyhow::Error as AnyhowError;
use std::any::Any;
use thiserror::Error;

/// Build-time failures. None of these are ever contained.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Step name must not be empty")]
  EmptyStepName,

  #[error("Unknown step '{step}': no descriptor with this name is registered in the catalog")]
  UnknownStep { step: String },

  #[error("Step '{step}' is already registered in the catalog")]
  DuplicateStep { step: String },

  #[error("Step '{step}' declares no constructors")]
  NoConstructors { step: String },

  #[error("Step '{step}' cannot be chained: none of its constructors takes the next step")]
  NotChainable { step: String },

  #[error("No constructor of step '{step}' could be satisfied: {}", .attempts.join("; "))]
  Unconstructible { step: String, attempts: Vec<String> },

  #[error("Invalid chain configuration. Source: {source}")]
  InvalidConfig {
    #[source]
    source: toml::de::Error,
  },

  #[error("Failed to read chain configuration '{path}'. Source: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// Run-time failures raised by a step's core logic.
#[derive(Debug, Error)]
pub enum StepError {
  #[error("Context item '{key}' is missing")]
  MissingItem { key: String },

  #[error("Context item '{key}' holds {actual}, expected {expected}")]
  ItemTypeMismatch {
    key: String,
    expected: &'static str,
    actual: &'static str,
  },

  #[error("Validation failed in step '{step}': {message}")]
  Validation { step: String, message: String },

  #[error("Request was cancelled")]
  Cancelled,

  #[error("Step panicked: {message}")]
  Panicked { message: String },

  #[error(transparent)]
  Failed(#[from] AnyhowError),
}

impl StepError {
  pub fn validation(step: impl Into<String>, message: impl Into<String>) -> Self {
    StepError::Validation {
      step: step.into(),
      message: message.into(),
    }
  }

  /// Turns a panic payload caught by `catch_unwind` into a recordable error.
  pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    StepError::Panicked {
      message: panic_message(payload.as_ref()),
    }
  }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&'static str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "non-string panic payload".to_string()
  }
}

pub type ConfigResult<T, E = ConfigError> = std::result::Result<T, E>;

pub type StepResult<T = (), E = StepError> = std::result::Result<T, E>;
