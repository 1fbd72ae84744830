//! Lazily-resolved component handles.
//!
//! DESIGN
//! ======
//! A handle is a cheap clone around shared state for one `(remote, component)`
//! key. Deferred handles hold a load slot: the first caller starts the load,
//! concurrent callers await the same in-flight future, and a success is kept
//! for the rest of the session. A failure clears the slot so that an explicit
//! retry fetches again instead of replaying the cached error.
//!
//! Loader panics are caught before the future is shared; a panicking loader
//! surfaces as `ComponentLoadError::Panicked` to every waiter.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::warn;

use super::error::{ComponentLoadError, RenderError, panic_message};
use super::registry::ModuleLoader;
use super::types::{ComponentKey, RemoteComponent, RenderContext};

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<dyn RemoteComponent>, ComponentLoadError>>>;

// =============================================================================
// PLACEHOLDER
// =============================================================================

/// Diagnostic stand-in rendered when a component cannot be resolved.
#[derive(Debug, Clone)]
pub struct UnregisteredPlaceholder {
    key: ComponentKey,
}

impl UnregisteredPlaceholder {
    #[must_use]
    pub fn new(key: ComponentKey) -> Self {
        Self { key }
    }
}

impl RemoteComponent for UnregisteredPlaceholder {
    fn render(&self, _ctx: &RenderContext) -> Result<String, RenderError> {
        Ok(format!(
            "<div class=\"remote-unavailable\"><h2>Component unavailable</h2>\
             <p>Could not load component: {}</p><p class=\"remote-name\">Remote: {}</p></div>",
            escape(&self.key.component),
            escape(&self.key.remote),
        ))
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// =============================================================================
// LOAD SLOT
// =============================================================================

enum LoadSlot {
    Idle,
    Pending { generation: u64, future: SharedLoad },
    Ready(Arc<dyn RemoteComponent>),
}

struct DeferredLoad {
    loader: ModuleLoader,
    slot: Mutex<LoadSlot>,
    next_generation: AtomicU64,
    /// Failures degrade to the placeholder instead of surfacing.
    degrade_to_placeholder: bool,
}

impl DeferredLoad {
    fn start(&self, key: &ComponentKey) -> (u64, SharedLoad) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let LoadSlot::Pending { generation, future } = &*slot {
            return (*generation, future.clone());
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let component = key.component.clone();
        let loader = Arc::clone(&self.loader);
        let future = AssertUnwindSafe(async move {
            let module = loader().await?;
            module.into_component(&component)
        })
        .catch_unwind()
        .map(|result| result.unwrap_or_else(|payload| Err(ComponentLoadError::Panicked(panic_message(&*payload)))))
        .boxed()
        .shared();

        *slot = LoadSlot::Pending { generation, future: future.clone() };
        (generation, future)
    }

    fn settle(&self, generation: u64, result: &Result<Arc<dyn RemoteComponent>, ComponentLoadError>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let current = matches!(&*slot, LoadSlot::Pending { generation: g, .. } if *g == generation);
        if !current {
            return;
        }
        *slot = match result {
            Ok(component) => LoadSlot::Ready(Arc::clone(component)),
            Err(_) => LoadSlot::Idle,
        };
    }

    fn ready(&self) -> Option<Arc<dyn RemoteComponent>> {
        match &*self.slot.lock().unwrap_or_else(PoisonError::into_inner) {
            LoadSlot::Ready(component) => Some(Arc::clone(component)),
            _ => None,
        }
    }

    async fn load(&self, key: &ComponentKey) -> Result<Arc<dyn RemoteComponent>, ComponentLoadError> {
        if let Some(component) = self.ready() {
            return Ok(component);
        }
        let (generation, future) = self.start(key);
        let result = future.await;
        self.settle(generation, &result);
        result
    }
}

// =============================================================================
// HANDLE
// =============================================================================

enum HandleSource {
    Deferred(DeferredLoad),
    Placeholder(Arc<UnregisteredPlaceholder>),
}

struct HandleInner {
    key: ComponentKey,
    source: HandleSource,
}

/// Opaque, cached, lazily-resolved reference to one remote component.
#[derive(Clone)]
pub struct ComponentHandle {
    inner: Arc<HandleInner>,
}

impl ComponentHandle {
    pub(crate) fn deferred(key: ComponentKey, loader: ModuleLoader, degrade_to_placeholder: bool) -> Self {
        let load = DeferredLoad {
            loader,
            slot: Mutex::new(LoadSlot::Idle),
            next_generation: AtomicU64::new(0),
            degrade_to_placeholder,
        };
        Self { inner: Arc::new(HandleInner { key, source: HandleSource::Deferred(load) }) }
    }

    pub(crate) fn placeholder(key: ComponentKey) -> Self {
        let placeholder = Arc::new(UnregisteredPlaceholder::new(key.clone()));
        Self { inner: Arc::new(HandleInner { key, source: HandleSource::Placeholder(placeholder) }) }
    }

    #[must_use]
    pub fn key(&self) -> &ComponentKey {
        &self.inner.key
    }

    /// True when the handle renders the diagnostic placeholder unconditionally.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.inner.source, HandleSource::Placeholder(_))
    }

    /// True when both handles share the same cached load.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve the component, starting or joining the load as needed.
    ///
    /// # Errors
    ///
    /// Returns the load failure for registered components. Placeholder and
    /// dynamic handles never fail.
    pub async fn load(&self) -> Result<Arc<dyn RemoteComponent>, ComponentLoadError> {
        let key = &self.inner.key;
        match &self.inner.source {
            HandleSource::Placeholder(placeholder) => Ok(Arc::clone(placeholder) as Arc<dyn RemoteComponent>),
            HandleSource::Deferred(load) => match load.load(key).await {
                Ok(component) => Ok(component),
                Err(e) if load.degrade_to_placeholder => {
                    warn!(remote = %key.remote, component = %key.component, error = %e, "dynamic component load failed; rendering placeholder");
                    Ok(Arc::new(UnregisteredPlaceholder::new(key.clone())))
                }
                Err(e) => Err(e),
            },
        }
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("key", &self.inner.key)
            .field("placeholder", &self.is_placeholder())
            .finish()
    }
}

#[cfg(test)]
#[path = "handle_test.rs"]
mod tests;
