// baton/src/config.rs

//! Declarative chain definitions.
//!
//! ```toml
//! name = "checkout"
//! steps = ["authenticate", "deserialize", "dispatch"]
//! ```
//!
//! Step names are looked up in the builder's `StepCatalog`, so the file only
//! decides which registered steps run and in what order.

use crate::error::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
  /// Used in logs only.
  #[serde(default = "default_chain_name")]
  pub name: String,
  /// Step names in execution order.
  #[serde(default)]
  pub steps: Vec<String>,
}

fn default_chain_name() -> String {
  "chain".to_string()
}

impl ChainConfig {
  pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
    toml::from_str(input).map_err(|source| ConfigError::InvalidConfig { source })
  }

  pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_toml_str(&contents)
  }
}
