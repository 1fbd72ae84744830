//! HTTP adapters for the remote contract.
//!
//! SYSTEM CONTEXT
//! ==============
//! These are the thinnest possible bridges between a remote's HTTP surface
//! and the shell's `RouteSource` / `ModuleLoader` seams. Routes come from a
//! JSON list; a component module is a JSON document holding markup for its
//! default export and any named exports.
//!
//! A module document may list the shared libraries it was built against.
//! Any the shell does not provide fails the load with `SharedDependency`
//! before the module is handed out.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use serde::Deserialize;

use super::error::{ComponentLoadError, RouteSourceError};
use super::loader::RouteSource;
use super::registry::ModuleLoader;
use super::types::{FragmentComponent, RemoteComponent, RemoteModule, RouteDeclaration};

// =============================================================================
// ROUTES
// =============================================================================

/// Fetches a remote's exported route list from `{base}/{routes_path}`.
pub struct HttpRouteSource {
    http: reqwest::Client,
    url: String,
}

impl HttpRouteSource {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str, routes_path: &str) -> Self {
        Self { http, url: join_url(base_url, routes_path) }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl RouteSource for HttpRouteSource {
    async fn fetch(&self) -> Result<Vec<RouteDeclaration>, RouteSourceError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RouteSourceError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(RouteSourceError::MissingExport);
        }
        if !response.status().is_success() {
            return Err(RouteSourceError::Status { status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RouteSourceError::Unreachable(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| RouteSourceError::Malformed(e.to_string()))
    }
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// Wire shape of a component module document.
#[derive(Debug, Deserialize)]
struct ModuleDocument {
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    named: HashMap<String, String>,
    /// Shared libraries the module expects the host to provide.
    #[serde(default)]
    shared: Vec<String>,
}

impl ModuleDocument {
    /// Shared libraries the document needs that `provided` lacks.
    fn missing_shared(&self, provided: &[String]) -> Vec<&str> {
        self.shared
            .iter()
            .filter(|name| !provided.contains(name))
            .map(String::as_str)
            .collect()
    }

    fn into_module(self) -> RemoteModule {
        let fragment = |markup: String| Arc::new(FragmentComponent::new(markup)) as Arc<dyn RemoteComponent>;
        RemoteModule {
            default: self.default.map(fragment),
            named: self
                .named
                .into_iter()
                .map(|(name, markup)| (name, fragment(markup)))
                .collect(),
        }
    }
}

/// Module loader for `{base}/components/{component}.json`. `provided` lists
/// the shared libraries the shell offers to remote modules.
#[must_use]
pub fn http_module_loader(http: reqwest::Client, base_url: &str, component: &str, provided: &[String]) -> ModuleLoader {
    let url = join_url(base_url, &format!("components/{component}.json"));
    let provided: Arc<[String]> = provided.into();
    Arc::new(move || fetch_module(http.clone(), url.clone(), Arc::clone(&provided)).boxed())
}

async fn fetch_module(http: reqwest::Client, url: String, provided: Arc<[String]>) -> Result<RemoteModule, ComponentLoadError> {
    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|e| ComponentLoadError::Network(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ComponentLoadError::Status { status: response.status().as_u16() });
    }
    let body = response
        .text()
        .await
        .map_err(|e| ComponentLoadError::Network(e.to_string()))?;
    let document: ModuleDocument =
        serde_json::from_str(&body).map_err(|e| ComponentLoadError::Malformed(e.to_string()))?;
    let missing = document.missing_shared(&provided);
    if !missing.is_empty() {
        return Err(ComponentLoadError::SharedDependency(format!(
            "remote requires {} not provided by the shell",
            missing.join(", ")
        )));
    }
    Ok(document.into_module())
}

/// Join a base URL and a relative path with exactly one slash.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
