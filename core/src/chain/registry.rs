// baton/src/chain/registry.rs

//! The dependency-resolution seam used by `ChainBuilder::build`.
//!
//! Constructor parameters other than the next step are looked up by their
//! declared type through a [`Resolver`]. [`ServiceRegistry`] is the bundled,
//! type-keyed implementation; any other container can be plugged in by
//! implementing the trait.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

/// Lookup-by-type service. Must answer `None` for unregistered types rather
/// than fail, so the builder can fall back to another constructor.
pub trait Resolver: Send + Sync {
  fn resolve_raw(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
  fn resolve_raw(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
    (**self).resolve_raw(type_id)
  }
}

struct Registration {
  type_name: &'static str,
  instance: Arc<dyn Any + Send + Sync>,
}

/// Type-keyed registry of shared service instances.
///
/// Every resolution hands out a clone of the same `Arc`, so a service used by
/// several steps (or several concurrent invocations) must be safe to share.
#[derive(Default)]
pub struct ServiceRegistry {
  services: RwLock<HashMap<TypeId, Registration>>,
}

impl ServiceRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `service` as the instance resolved for `T`, replacing any earlier one.
  pub fn register<T: Any + Send + Sync>(&self, service: T) {
    self.register_arc(Arc::new(service));
  }

  pub fn register_arc<T: Any + Send + Sync>(&self, service: Arc<T>) {
    let type_name = std::any::type_name::<T>();
    event!(Level::DEBUG, service_type = %type_name, "Registering service.");
    let previous = self.services.write().insert(
      TypeId::of::<T>(),
      Registration {
        type_name,
        instance: service,
      },
    );
    if previous.is_some() {
      event!(Level::DEBUG, service_type = %type_name, "Replaced previously registered service.");
    }
  }

  pub fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self
      .resolve_raw(TypeId::of::<T>())
      .and_then(|instance| instance.downcast::<T>().ok())
  }

  pub fn contains<T: Any>(&self) -> bool {
    self.services.read().contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.services.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.read().is_empty()
  }

  /// Type names of every registered service, in no particular order.
  pub fn registered_types(&self) -> Vec<&'static str> {
    self.services.read().values().map(|r| r.type_name).collect()
  }
}

impl Resolver for ServiceRegistry {
  fn resolve_raw(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
    self.services.read().get(&type_id).map(|r| r.instance.clone())
  }
}

/// A resolver that knows no services.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyResolver;

impl Resolver for EmptyResolver {
  fn resolve_raw(&self, _type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
    None
  }
}
