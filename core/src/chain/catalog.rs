// baton/src/chain/catalog.rs

//! Name-keyed collection of [`StepDescriptor`]s, used when a chain is declared
//! by step names (for example from a configuration file) instead of by type.

use crate::chain::descriptor::{ChainStep, StepDescriptor};
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;
use tracing::{event, Level};

#[derive(Debug, Default, Clone)]
pub struct StepCatalog {
  descriptors: HashMap<String, StepDescriptor>,
}

impl StepCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `descriptor` under its own name. Names are unique.
  pub fn register(&mut self, descriptor: StepDescriptor) -> ConfigResult<&mut Self> {
    let name = descriptor.name().to_string();
    if name.is_empty() {
      return Err(ConfigError::EmptyStepName);
    }
    if self.descriptors.contains_key(&name) {
      return Err(ConfigError::DuplicateStep { step: name });
    }
    event!(Level::DEBUG, step = %name, constructors = descriptor.constructors().len(), "Step registered in catalog.");
    self.descriptors.insert(name, descriptor);
    Ok(self)
  }

  /// Registers a typed step under the name its descriptor declares.
  pub fn register_step<S: ChainStep>(&mut self) -> ConfigResult<&mut Self> {
    self.register(S::descriptor())
  }

  pub fn get(&self, name: &str) -> Option<&StepDescriptor> {
    self.descriptors.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.descriptors.contains_key(name)
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  pub fn len(&self) -> usize {
    self.descriptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.descriptors.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chain::descriptor::{Args, Constructor};
  use crate::step::contract::Terminal;

  fn descriptor(name: &str) -> StepDescriptor {
    StepDescriptor::new(name).constructor(Constructor::new(|_args: &Args| Ok(Terminal)).with_next())
  }

  #[test]
  fn rejects_duplicate_and_empty_names() {
    let mut catalog = StepCatalog::new();
    catalog.register(descriptor("auth")).unwrap();

    assert!(matches!(
      catalog.register(descriptor("auth")),
      Err(ConfigError::DuplicateStep { step }) if step == "auth"
    ));
    assert!(matches!(catalog.register(descriptor("")), Err(ConfigError::EmptyStepName)));
    assert_eq!(catalog.len(), 1);
  }

  #[test]
  fn names_are_sorted() {
    let mut catalog = StepCatalog::new();
    catalog
      .register(descriptor("zeta"))
      .unwrap()
      .register(descriptor("alpha"))
      .unwrap();
    assert_eq!(catalog.names(), vec!["alpha", "zeta"]);
    assert!(catalog.contains("zeta"));
    assert!(catalog.get("beta").is_none());
  }
}
