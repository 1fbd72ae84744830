//! Startup wiring: manifest → remote entries, registry, and background tasks.
//!
//! SYSTEM CONTEXT
//! ==============
//! The binary calls into this module once. Route aggregation and diagnostics
//! run as background tasks so the HTTP listener is up immediately; the route
//! table reports `Loading` until aggregation publishes.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{HttpTimeouts, RemoteManifest, ShellConfig};
use crate::remote::diagnostics::RemoteDiagnostics;
use crate::remote::http::{HttpRouteSource, http_module_loader, join_url};
use crate::remote::{ComponentRegistry, RemoteAppEntry, RemoteComponentResolver, RouteAggregator};
use crate::routes::RESERVED_PATHS;
use crate::state::ShellState;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Build the shared HTTP client used for every remote.
///
/// # Errors
///
/// Returns an error if the client fails to build.
pub fn http_client(timeouts: HttpTimeouts) -> Result<reqwest::Client, StartupError> {
    reqwest::Client::builder()
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .build()
        .map_err(|e| StartupError::HttpClientBuild(e.to_string()))
}

/// One `RemoteAppEntry` per manifest remote, in manifest order.
#[must_use]
pub fn build_entries(manifest: &RemoteManifest, http: &reqwest::Client) -> Vec<RemoteAppEntry> {
    manifest
        .remotes
        .iter()
        .map(|spec| {
            let mut entry = RemoteAppEntry::new(spec.name.clone());
            entry.enabled = spec.enabled;
            entry.fallback_routes.clone_from(&spec.fallback_routes);
            match spec.base_url() {
                Some(base) => {
                    let source = HttpRouteSource::new(http.clone(), &base, &spec.routes_path);
                    entry.route_source = Some(Arc::new(source));
                }
                None if spec.enabled => {
                    warn!(remote = %spec.name, var = %spec.url_var(), "remote base URL not set; only fallback routes apply");
                }
                None => {}
            }
            entry
        })
        .collect()
}

/// Register an HTTP module loader for every declared `(remote, component)`
/// pair whose remote has a base URL. Loaders check modules against the
/// manifest's shared libraries.
#[must_use]
pub fn build_registry(manifest: &RemoteManifest, http: &reqwest::Client) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    for spec in manifest.remotes.iter().filter(|s| s.enabled) {
        let Some(base) = spec.base_url() else {
            continue;
        };
        for component in &spec.components {
            registry.register(&spec.name, component, http_module_loader(http.clone(), &base, component, &manifest.shared));
        }
    }
    registry
}

/// Entry-point URLs for every enabled remote with a base URL.
#[must_use]
pub fn entry_urls(manifest: &RemoteManifest) -> Vec<(String, String)> {
    manifest
        .remotes
        .iter()
        .filter(|s| s.enabled)
        .filter_map(|s| s.base_url().map(|base| (s.name.clone(), join_url(&base, &s.entry_path))))
        .collect()
}

/// Build shell state plus the remote entries to aggregate.
///
/// # Errors
///
/// Returns an error if the HTTP client fails to build.
pub fn build_shell(config: &ShellConfig) -> Result<(ShellState, Vec<RemoteAppEntry>), StartupError> {
    let http = http_client(config.http)?;
    let entries = build_entries(&config.manifest, &http);
    let registry = build_registry(&config.manifest, &http);
    info!(remotes = entries.len(), registry = ?registry, "remote configuration loaded");

    let resolver = Arc::new(RemoteComponentResolver::new(Arc::new(registry)));
    Ok((ShellState::new(config.brand.clone(), resolver), entries))
}

/// Route aggregator bounded by the configured per-remote timeout, with the
/// shell's own paths reserved.
#[must_use]
pub fn route_aggregator(config: &ShellConfig) -> RouteAggregator {
    RouteAggregator::new(config.routes_timeout).reserving(RESERVED_PATHS)
}

/// Aggregate routes in the background and publish the table once.
pub fn spawn_route_aggregation(
    state: &ShellState,
    entries: Vec<RemoteAppEntry>,
    aggregator: RouteAggregator,
) -> JoinHandle<()> {
    let table = state.routes.clone();
    tokio::spawn(async move {
        let report = aggregator.aggregate_with_report(&entries).await;
        table.publish(report);
    })
}

/// Probe every remote entry point in the background. Advisory only.
///
/// Probes share the shell's configured HTTP timeouts.
pub fn spawn_diagnostics(manifest: &RemoteManifest, timeouts: HttpTimeouts) -> Option<JoinHandle<()>> {
    let remotes = entry_urls(manifest);
    let diagnostics = match http_client(timeouts) {
        Ok(http) => RemoteDiagnostics::from_client(http),
        Err(e) => {
            warn!(error = %e, "remote diagnostics disabled");
            return None;
        }
    };
    Some(tokio::spawn(async move {
        let reports = diagnostics.diagnose_all(&remotes).await;
        let failing = reports.iter().filter(|r| !r.probe.is_working()).count();
        info!(remotes = reports.len(), failing, "remote diagnostics finished");
    }))
}

#[cfg(test)]
#[path = "startup_test.rs"]
mod tests;
