//! Route and component data model shared across the remote subsystem.
//!
//! DESIGN
//! ======
//! `RouteDeclaration` is the remote-authored wire shape and arrives as JSON,
//! so it keeps the remote contract's field names (`component`, `showInNav`).
//! Components are referenced by name only; nothing here holds remote code.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{ComponentLoadError, RenderError};

// =============================================================================
// ROUTES
// =============================================================================

/// One navigable entry point contributed by a remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDeclaration {
    pub path: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Symbolic name of the exposed component, resolved later by name.
    #[serde(rename = "component", alias = "componentRef")]
    pub component_ref: String,
    #[serde(default = "default_show_in_nav")]
    pub show_in_nav: bool,
}

fn default_show_in_nav() -> bool {
    true
}

impl RouteDeclaration {
    #[must_use]
    pub fn new(path: impl Into<String>, label: impl Into<String>, component_ref: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            icon: None,
            component_ref: component_ref.into(),
            show_in_nav: true,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.show_in_nav = false;
        self
    }

    /// Tag this declaration with the remote that contributed it.
    #[must_use]
    pub fn owned_by(self, remote: &str) -> AggregatedRoute {
        AggregatedRoute { route: self, remote_owner: remote.to_string() }
    }
}

/// A route declaration plus the remote that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRoute {
    #[serde(flatten)]
    pub route: RouteDeclaration,
    pub remote_owner: String,
}

impl AggregatedRoute {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.route.path
    }

    #[must_use]
    pub fn component_key(&self) -> ComponentKey {
        ComponentKey::new(&self.remote_owner, &self.route.component_ref)
    }
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// `(remote, component)` identity used by the registry and the handle cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    pub remote: String,
    pub component: String,
}

impl ComponentKey {
    #[must_use]
    pub fn new(remote: &str, component: &str) -> Self {
        Self { remote: remote.to_string(), component: component.to_string() }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote, self.component)
    }
}

/// Inputs handed to a component when it is mounted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// Route path being rendered, empty when mounted outside the router.
    pub path: String,
}

/// A render-ready unit exposed by a remote.
pub trait RemoteComponent: Send + Sync {
    /// Produce the component's markup.
    ///
    /// # Errors
    ///
    /// Returns an error when the component fails while mounting.
    fn render(&self, ctx: &RenderContext) -> Result<String, RenderError>;
}

/// Component backed by a fixed markup fragment.
#[derive(Debug, Clone)]
pub struct FragmentComponent {
    markup: String,
}

impl FragmentComponent {
    #[must_use]
    pub fn new(markup: impl Into<String>) -> Self {
        Self { markup: markup.into() }
    }
}

impl RemoteComponent for FragmentComponent {
    fn render(&self, _ctx: &RenderContext) -> Result<String, RenderError> {
        Ok(self.markup.clone())
    }
}

/// A loaded remote module: an optional default export plus named exports.
#[derive(Clone, Default)]
pub struct RemoteModule {
    pub default: Option<Arc<dyn RemoteComponent>>,
    pub named: HashMap<String, Arc<dyn RemoteComponent>>,
}

impl RemoteModule {
    #[must_use]
    pub fn with_default(component: Arc<dyn RemoteComponent>) -> Self {
        Self { default: Some(component), named: HashMap::new() }
    }

    #[must_use]
    pub fn with_named(mut self, name: impl Into<String>, component: Arc<dyn RemoteComponent>) -> Self {
        self.named.insert(name.into(), component);
        self
    }

    /// Pick the module's component: the default export, else the named
    /// export matching `component`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentLoadError::MissingExport`] when neither exists.
    pub fn into_component(mut self, component: &str) -> Result<Arc<dyn RemoteComponent>, ComponentLoadError> {
        if let Some(default) = self.default.take() {
            return Ok(default);
        }
        self.named
            .remove(component)
            .ok_or_else(|| ComponentLoadError::MissingExport { component: component.to_string() })
    }
}

impl fmt::Debug for RemoteModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut named: Vec<&String> = self.named.keys().collect();
        named.sort();
        f.debug_struct("RemoteModule")
            .field("default", &self.default.is_some())
            .field("named", &named)
            .finish()
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
