//! Resolution of `(remote, component)` pairs into cached handles.
//!
//! DESIGN
//! ======
//! The resolver owns handle identity: the first resolution of a key creates
//! the handle and every later resolution of the same key returns it. Misses
//! produce a placeholder handle instead of an error so the shell always has
//! something to render.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use super::handle::ComponentHandle;
use super::registry::{ComponentRegistry, Lookup};
use super::types::ComponentKey;

pub struct RemoteComponentResolver {
    registry: Arc<ComponentRegistry>,
    cache: Mutex<HashMap<ComponentKey, ComponentHandle>>,
}

impl RemoteComponentResolver {
    #[must_use]
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry, cache: Mutex::new(HashMap::new()) }
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Return the session handle for `(remote_name, component_name)`.
    ///
    /// Never fails; unregistered pairs resolve to a diagnostic placeholder.
    pub fn resolve(&self, remote_name: &str, component_name: &str) -> ComponentHandle {
        let key = ComponentKey::new(remote_name, component_name);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = cache.get(&key) {
            return handle.clone();
        }

        let handle = match self.registry.lookup(remote_name, component_name) {
            Lookup::Registered(loader) => {
                debug!(remote = %remote_name, component = %component_name, "component handle created");
                ComponentHandle::deferred(key.clone(), loader, false)
            }
            Lookup::Dynamic(loader) => {
                warn!(
                    remote = %remote_name,
                    component = %component_name,
                    "component not registered; trying dynamic resolution, which is unreliable"
                );
                ComponentHandle::deferred(key.clone(), loader, true)
            }
            Lookup::UnknownRemote => {
                warn!(remote = %remote_name, component = %component_name, "remote not registered; rendering placeholder");
                ComponentHandle::placeholder(key.clone())
            }
            Lookup::UnknownComponent => {
                warn!(remote = %remote_name, component = %component_name, "component not registered; rendering placeholder");
                ComponentHandle::placeholder(key.clone())
            }
        };

        cache.insert(key, handle.clone());
        handle
    }

    /// Number of keys resolved so far this session.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
