//! Route aggregation across all configured remotes.
//!
//! DESIGN
//! ======
//! Every enabled remote with a route source is loaded concurrently and the
//! aggregator joins on all of them before producing one flat table. The table
//! is ordered by remote configuration order, then by declaration order.
//!
//! TRADE-OFFS
//! ==========
//! A hung remote would otherwise hold the table back forever, so each load is
//! bounded by an optional per-remote timeout that degrades to zero routes.
//! Path collisions are resolved first-declaration-wins; the dropped routes are
//! reported rather than silently overwritten. Paths the shell serves itself
//! are reserved up front, so a remote can never claim them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use super::loader::{LoadOutcome, RemoteStatus, RouteLoader, RouteSource, StaticRoutes};
use super::types::{AggregatedRoute, RouteDeclaration};

// =============================================================================
// ENTRY
// =============================================================================

/// Static configuration for one remote, read once at startup.
#[derive(Clone)]
pub struct RemoteAppEntry {
    pub name: String,
    pub route_source: Option<Arc<dyn RouteSource>>,
    pub fallback_routes: Option<Vec<RouteDeclaration>>,
    pub enabled: bool,
}

impl RemoteAppEntry {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), route_source: None, fallback_routes: None, enabled: true }
    }

    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn RouteSource>) -> Self {
        self.route_source = Some(source);
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, routes: Vec<RouteDeclaration>) -> Self {
        self.fallback_routes = Some(routes);
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl fmt::Debug for RemoteAppEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteAppEntry")
            .field("name", &self.name)
            .field("route_source", &self.route_source.is_some())
            .field("fallback_routes", &self.fallback_routes.as_ref().map(Vec::len))
            .field("enabled", &self.enabled)
            .finish()
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// A route dropped because an earlier route already claimed its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCollision {
    pub path: String,
    pub kept_owner: String,
    pub dropped_owner: String,
}

/// Per-remote outcome of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteReport {
    pub remote: String,
    #[serde(flatten)]
    pub status: RemoteStatus,
}

/// Route table plus what happened to each remote while building it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    pub routes: Vec<AggregatedRoute>,
    pub remotes: Vec<RemoteReport>,
    pub collisions: Vec<PathCollision>,
}

// =============================================================================
// AGGREGATOR
// =============================================================================

/// Owner recorded for paths the shell reserves for itself.
pub const SHELL_OWNER: &str = "shell";

/// Fans route loading out across remotes and merges the results.
#[derive(Debug, Clone, Default)]
pub struct RouteAggregator {
    loader: RouteLoader,
    per_remote_timeout: Option<Duration>,
    /// Exact paths, or prefixes written as `/api/*`.
    reserved: Vec<String>,
}

impl RouteAggregator {
    #[must_use]
    pub fn new(per_remote_timeout: Option<Duration>) -> Self {
        Self { loader: RouteLoader::new(), per_remote_timeout, reserved: Vec::new() }
    }

    /// Treat `paths` as already claimed by the shell.
    #[must_use]
    pub fn reserving<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(paths.into_iter().map(Into::into));
        self
    }

    /// True when `path` is one the shell serves itself.
    #[must_use]
    pub fn is_reserved(&self, path: &str) -> bool {
        self.reserved.iter().any(|reserved| match reserved.strip_suffix("/*") {
            Some(prefix) => path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/')),
            None => path == reserved,
        })
    }

    /// Build the route table from `entries`. Never fails.
    pub async fn aggregate(&self, entries: &[RemoteAppEntry]) -> Vec<AggregatedRoute> {
        self.aggregate_with_report(entries).await.routes
    }

    /// Build the route table and the per-remote report.
    pub async fn aggregate_with_report(&self, entries: &[RemoteAppEntry]) -> AggregateReport {
        let loads = entries.iter().map(|entry| async move {
            if !entry.enabled {
                return (entry.name.as_str(), LoadOutcome { routes: Vec::new(), status: RemoteStatus::Disabled });
            }
            let fallback = entry.fallback_routes.as_deref();
            let outcome = match (&entry.route_source, fallback) {
                (Some(source), _) => self.load_bounded(&entry.name, source.as_ref(), fallback).await,
                (None, Some(bundled)) => self.loader.load_outcome(&entry.name, &StaticRoutes(bundled.to_vec())).await,
                (None, None) => LoadOutcome { routes: Vec::new(), status: RemoteStatus::NoRouteSource },
            };
            (entry.name.as_str(), outcome)
        });
        let outcomes = join_all(loads).await;

        let mut report = AggregateReport::default();
        let mut owners: HashMap<String, String> = HashMap::new();
        for (name, outcome) in outcomes {
            report.remotes.push(RemoteReport { remote: name.to_string(), status: outcome.status });
            for route in outcome.routes {
                if self.is_reserved(route.path()) {
                    warn!(
                        path = %route.path(),
                        dropped = %route.remote_owner,
                        "route path is served by the shell; dropping remote declaration"
                    );
                    report.collisions.push(PathCollision {
                        path: route.path().to_string(),
                        kept_owner: SHELL_OWNER.to_string(),
                        dropped_owner: route.remote_owner.clone(),
                    });
                    continue;
                }
                if let Some(kept_owner) = owners.get(route.path()) {
                    warn!(
                        path = %route.path(),
                        kept = %kept_owner,
                        dropped = %route.remote_owner,
                        "route path already claimed; dropping later declaration"
                    );
                    report.collisions.push(PathCollision {
                        path: route.path().to_string(),
                        kept_owner: kept_owner.clone(),
                        dropped_owner: route.remote_owner.clone(),
                    });
                    continue;
                }
                owners.insert(route.path().to_string(), route.remote_owner.clone());
                report.routes.push(route);
            }
        }

        info!(
            routes = report.routes.len(),
            remotes = report.remotes.len(),
            collisions = report.collisions.len(),
            "route aggregation complete"
        );
        report
    }

    /// Load one remote, bounded by the per-remote timeout. A failure or
    /// timeout falls back to the bundled list when there is one.
    async fn load_bounded(&self, name: &str, source: &dyn RouteSource, fallback: Option<&[RouteDeclaration]>) -> LoadOutcome {
        let outcome = match self.per_remote_timeout {
            None => self.loader.load_outcome(name, source).await,
            Some(limit) => {
                if let Ok(outcome) = tokio::time::timeout(limit, self.loader.load_outcome(name, source)).await {
                    outcome
                } else {
                    let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    warn!(remote = %name, timeout_ms, "remote route load timed out; remote contributes no routes");
                    LoadOutcome { routes: Vec::new(), status: RemoteStatus::TimedOut { timeout_ms } }
                }
            }
        };

        let Some(bundled) = fallback else {
            return outcome;
        };
        let reason = match &outcome.status {
            RemoteStatus::Degraded { reason, .. } => reason.clone(),
            RemoteStatus::TimedOut { timeout_ms } => format!("timed out after {timeout_ms} ms"),
            _ => return outcome,
        };
        self.loader.fall_back(name, reason, bundled)
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
