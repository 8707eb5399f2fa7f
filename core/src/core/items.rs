// baton/src/core/items.rs

//! The ordered, string-keyed, heterogeneous item map carried by every [`Context`].
//!
//! Items are the only channel steps use to exchange data. Every entry remembers
//! the type name it was stored with, so a read with the wrong type reports both
//! the expected and the actual type instead of silently yielding nothing.
//!
//! [`Context`]: crate::core::context::Context

use crate::error::{StepError, StepResult};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;

/// A single boxed value stored in [`Items`].
pub struct Entry {
  value: Box<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl Entry {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self {
      value: Box::new(value),
      type_name: std::any::type_name::<T>(),
    }
  }

  /// Name of the type this entry was stored with.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn is<T: Any>(&self) -> bool {
    self.value.is::<T>()
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.value.downcast_ref::<T>()
  }

  pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
    self.value.downcast_mut::<T>()
  }

  /// Unboxes the value, handing the entry back untouched on a type mismatch.
  pub fn into_inner<T: Any>(self) -> Result<T, Entry> {
    let type_name = self.type_name;
    match self.value.downcast::<T>() {
      Ok(boxed) => Ok(*boxed),
      Err(value) => Err(Entry { value, type_name }),
    }
  }
}

impl fmt::Debug for Entry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Entry").field("type_name", &self.type_name).finish()
  }
}

/// Insertion-ordered map from key to [`Entry`], last write wins.
#[derive(Debug, Default)]
pub struct Items {
  entries: IndexMap<String, Entry>,
}

impl Items {
  pub fn new() -> Self {
    Self::default()
  }

  /// Stores `value` under `key`, returning whatever was stored there before.
  /// An overwritten key keeps its original position.
  pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) -> Option<Entry> {
    self.entries.insert(key.into(), Entry::new(value))
  }

  pub fn insert_entry(&mut self, key: impl Into<String>, entry: Entry) -> Option<Entry> {
    self.entries.insert(key.into(), entry)
  }

  /// Typed read. Missing keys and wrong types are both errors.
  pub fn get<T: Any>(&self, key: &str) -> StepResult<&T> {
    let entry = self.entries.get(key).ok_or_else(|| missing(key))?;
    let actual = entry.type_name;
    entry.downcast_ref::<T>().ok_or_else(|| mismatch::<T>(key, actual))
  }

  pub fn get_mut<T: Any>(&mut self, key: &str) -> StepResult<&mut T> {
    let entry = self.entries.get_mut(key).ok_or_else(|| missing(key))?;
    let actual = entry.type_name;
    entry.downcast_mut::<T>().ok_or_else(|| mismatch::<T>(key, actual))
  }

  /// Lenient read: `None` on a missing key or a type mismatch.
  pub fn try_get<T: Any>(&self, key: &str) -> Option<&T> {
    self.entries.get(key).and_then(|entry| entry.downcast_ref::<T>())
  }

  /// Returns a copy of the stored value, or `T::default()` when the key is absent.
  /// A present value of the wrong type is still an error.
  pub fn get_or_default<T: Any + Clone + Default>(&self, key: &str) -> StepResult<T> {
    match self.entries.get(key) {
      None => Ok(T::default()),
      Some(entry) => entry
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| mismatch::<T>(key, entry.type_name)),
    }
  }

  /// Typed removal. On a type mismatch the entry stays where it was.
  pub fn take<T: Any>(&mut self, key: &str) -> StepResult<T> {
    let (index, _, entry) = self.entries.shift_remove_full(key).ok_or_else(|| missing(key))?;
    match entry.into_inner::<T>() {
      Ok(value) => Ok(value),
      Err(entry) => {
        let actual = entry.type_name;
        self.entries.shift_insert(index, key.to_string(), entry);
        Err(mismatch::<T>(key, actual))
      }
    }
  }

  /// Removes `key`, keeping the relative order of the remaining entries.
  pub fn remove(&mut self, key: &str) -> Option<Entry> {
    self.entries.shift_remove(key)
  }

  /// Removes `key` and reports the position it occupied.
  pub(crate) fn remove_full(&mut self, key: &str) -> Option<(usize, Entry)> {
    self
      .entries
      .shift_remove_full(key)
      .map(|(index, _, entry)| (index, entry))
  }

  /// Puts `entry` back at `index` (clamped to the current length),
  /// displacing any value currently stored under `key`.
  pub(crate) fn restore_at(&mut self, index: usize, key: &str, entry: Entry) {
    self.entries.shift_remove(key);
    let index = index.min(self.entries.len());
    self.entries.shift_insert(index, key.to_string(), entry);
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

fn missing(key: &str) -> StepError {
  StepError::MissingItem { key: key.to_string() }
}

fn mismatch<T: Any>(key: &str, actual: &'static str) -> StepError {
  StepError::ItemTypeMismatch {
    key: key.to_string(),
    expected: std::any::type_name::<T>(),
    actual,
  }
}
