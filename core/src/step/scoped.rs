// baton/src/step/scoped.rs

//! Steps that install transient context items for the benefit of downstream
//! steps and guarantee the previous items are put back afterwards.
//!
//! [`Scoped`] turns a [`ScopedStep`] into [`StepLogic`]:
//!
//! 1. `before_invoke` validates preconditions.
//! 2. Every cached name is captured: its current entry (if any) and position are
//!    moved out of the items into a [`Snapshot`].
//! 3. `install` places the transient entries, then `invoke_scoped` runs the
//!    wrapped logic, which normally delegates to the next step.
//! 4. The snapshot is restored on every exit path: success, a downstream fault
//!    contained further down, an error returned by `install`/`invoke_scoped`,
//!    or a panic in either. Names that did not exist before are removed.

use crate::core::context::Context;
use crate::core::items::{Entry, Items};
use crate::error::{StepError, StepResult};
use crate::step::contract::StepLogic;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{event, Level};

#[async_trait]
pub trait ScopedStep: Send + Sync {
  /// Item keys this step installs and restores.
  fn cached_names(&self) -> Vec<&str>;

  /// Precondition checks, run before anything is captured.
  fn before_invoke(&self, _ctx: &Context) -> StepResult {
    Ok(())
  }

  /// Installs the transient entries. Values that were stored under the cached
  /// names before this step ran are available through `previous`.
  ///
  /// Every cached name is moved out of the items before this runs, so a name
  /// left uninstalled is absent for downstream steps until restoration.
  fn install(&self, ctx: &mut Context, previous: &Snapshot) -> StepResult;

  /// The wrapped logic; forwards the request downstream.
  async fn invoke_scoped(&self, ctx: &mut Context) -> StepResult;

  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }
}

/// Entries captured for the cached names of a [`ScopedStep`].
#[derive(Debug, Default)]
pub struct Snapshot {
  saved: Vec<(String, Option<(usize, Entry)>)>,
}

impl Snapshot {
  /// Moves the current entries for `names` out of `items`.
  pub(crate) fn capture(items: &mut Items, names: &[&str]) -> Self {
    let saved = names
      .iter()
      .map(|name| (name.to_string(), items.remove_full(name)))
      .collect();
    Self { saved }
  }

  /// The value `name` held before the step ran, if it was of type `T`.
  pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
    self
      .saved
      .iter()
      .find(|(saved_name, _)| saved_name == name)
      .and_then(|(_, slot)| slot.as_ref())
      .and_then(|(_, entry)| entry.downcast_ref::<T>())
  }

  pub fn existed(&self, name: &str) -> bool {
    self
      .saved
      .iter()
      .any(|(saved_name, slot)| saved_name == name && slot.is_some())
  }

  /// Puts every captured entry back, removing names that had none.
  pub(crate) fn restore(self, items: &mut Items) {
    // Reverse order keeps the captured indices valid.
    for (name, slot) in self.saved.into_iter().rev() {
      match slot {
        Some((index, entry)) => items.restore_at(index, &name, entry),
        None => {
          items.remove(&name);
        }
      }
    }
  }
}

/// Adapts a [`ScopedStep`] into [`StepLogic`] with guaranteed restoration.
pub struct Scoped<S>(pub S);

impl<S: ScopedStep> Scoped<S> {
  pub fn cached_names(&self) -> Vec<&str> {
    self.0.cached_names()
  }

  pub fn inner(&self) -> &S {
    &self.0
  }
}

#[async_trait]
impl<S: ScopedStep> StepLogic for Scoped<S> {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    self.0.before_invoke(ctx)?;

    let names = self.0.cached_names();
    let snapshot = Snapshot::capture(ctx.items_mut(), &names);
    event!(Level::TRACE, step = self.0.name(), cached = ?names, "Captured scoped items.");

    let outcome = AssertUnwindSafe(async {
      self.0.install(ctx, &snapshot)?;
      self.0.invoke_scoped(ctx).await
    })
    .catch_unwind()
    .await;

    snapshot.restore(ctx.items_mut());
    event!(Level::TRACE, step = self.0.name(), "Restored scoped items.");

    match outcome {
      Ok(result) => result,
      Err(payload) => Err(StepError::from_panic(payload)),
    }
  }

  fn name(&self) -> &str {
    self.0.name()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn snapshot_restores_previous_values_and_removes_new_ones() {
    let mut items = Items::new();
    items.insert("a", 1_i32);
    items.insert("x", "outer".to_string());
    items.insert("z", 3_i32);

    let snapshot = Snapshot::capture(&mut items, &["x", "y"]);
    assert!(snapshot.existed("x"));
    assert!(!snapshot.existed("y"));
    assert_eq!(snapshot.get::<String>("x").map(String::as_str), Some("outer"));
    assert_eq!(items.keys().collect::<Vec<_>>(), vec!["a", "z"]);

    items.insert("x", "inner".to_string());
    items.insert("y", 9_i32);
    items.insert("downstream", true);
    snapshot.restore(&mut items);

    assert_eq!(items.keys().collect::<Vec<_>>(), vec!["a", "x", "z", "downstream"]);
    assert_eq!(items.get::<String>("x").unwrap(), "outer");
  }
}
