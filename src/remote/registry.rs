//! Static component registry.
//!
//! DESIGN
//! ======
//! Component loaders are registered ahead of time under a two-level key:
//! remote name, then component name. Lookups return a tagged `Lookup` so an
//! unregistered pair is an ordinary outcome rather than an error path.
//!
//! A dynamic loader that builds the module reference from the two names at
//! runtime can be attached as a last resort. It is only consulted on a static
//! miss and is treated as unreliable by the resolver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::error::ComponentLoadError;
use super::types::RemoteModule;

/// Deferred load of one remote module.
pub type ModuleLoader = Arc<dyn Fn() -> BoxFuture<'static, Result<RemoteModule, ComponentLoadError>> + Send + Sync>;

/// Loader keyed by names assembled at runtime.
pub type DynamicLoader =
    Arc<dyn Fn(&str, &str) -> BoxFuture<'static, Result<RemoteModule, ComponentLoadError>> + Send + Sync>;

/// Result of a registry lookup.
#[derive(Clone)]
pub enum Lookup {
    Registered(ModuleLoader),
    /// Not registered, but the dynamic last-resort loader can try it.
    Dynamic(ModuleLoader),
    UnknownRemote,
    UnknownComponent,
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(_) => f.write_str("Registered"),
            Self::Dynamic(_) => f.write_str("Dynamic"),
            Self::UnknownRemote => f.write_str("UnknownRemote"),
            Self::UnknownComponent => f.write_str("UnknownComponent"),
        }
    }
}

/// Remote name → component name → module loader.
#[derive(Default, Clone)]
pub struct ComponentRegistry {
    remotes: HashMap<String, HashMap<String, ModuleLoader>>,
    dynamic: Option<DynamicLoader>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `loader` for `(remote, component)`, replacing any earlier one.
    pub fn register(&mut self, remote: &str, component: &str, loader: ModuleLoader) {
        self.remotes
            .entry(remote.to_string())
            .or_default()
            .insert(component.to_string(), loader);
    }

    /// Builder form of [`ComponentRegistry::register`].
    #[must_use]
    pub fn with(mut self, remote: &str, component: &str, loader: ModuleLoader) -> Self {
        self.register(remote, component, loader);
        self
    }

    /// Attach the last-resort dynamic loader.
    #[must_use]
    pub fn with_dynamic_fallback(mut self, loader: DynamicLoader) -> Self {
        self.dynamic = Some(loader);
        self
    }

    #[must_use]
    pub fn lookup(&self, remote: &str, component: &str) -> Lookup {
        let static_miss = match self.remotes.get(remote) {
            None => Lookup::UnknownRemote,
            Some(components) => match components.get(component) {
                Some(loader) => return Lookup::Registered(Arc::clone(loader)),
                None => Lookup::UnknownComponent,
            },
        };

        match &self.dynamic {
            Some(dynamic) => {
                let dynamic = Arc::clone(dynamic);
                let (remote, component) = (remote.to_string(), component.to_string());
                Lookup::Dynamic(Arc::new(move || dynamic(&remote, &component)))
            }
            None => static_miss,
        }
    }

    /// Registered remote names, sorted.
    #[must_use]
    pub fn remotes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.remotes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered component names under `remote`, sorted.
    #[must_use]
    pub fn components(&self, remote: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .remotes
            .get(remote)
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for remote in self.remotes() {
            map.entry(&remote, &self.components(remote));
        }
        map.finish()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
