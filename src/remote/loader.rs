//! Route loading for a single remote.
//!
//! DESIGN
//! ======
//! A `RouteSource` is whatever yields a remote's route declarations: an HTTP
//! fetch or a statically bundled list. `RouteLoader` invokes one source, tags
//! the result with the owning remote, and degrades every failure to an empty
//! contribution. A failed remote with a bundled list gets that list instead,
//! reported as `Fallback` so operators can tell it apart from live routes.
//!
//! ERROR HANDLING
//! ==============
//! Failures, including a panicking source, are logged with the remote name
//! and a classified hint, then swallowed. Nothing in this module returns an
//! error to the aggregator.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{LoadHint, RouteSourceError, panic_message};
use super::types::{AggregatedRoute, RouteDeclaration};

// =============================================================================
// ROUTE SOURCES
// =============================================================================

/// Asynchronous provider of a remote's exported route list.
#[async_trait::async_trait]
pub trait RouteSource: Send + Sync {
    /// Fetch the remote's route declarations.
    async fn fetch(&self) -> Result<Vec<RouteDeclaration>, RouteSourceError>;
}

/// Route list bundled with the shell.
#[derive(Debug, Clone)]
pub struct StaticRoutes(pub Vec<RouteDeclaration>);

#[async_trait::async_trait]
impl RouteSource for StaticRoutes {
    async fn fetch(&self) -> Result<Vec<RouteDeclaration>, RouteSourceError> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// LOADER
// =============================================================================

/// How a single remote's route load ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteStatus {
    Loaded { routes: usize },
    Degraded { reason: String, hint: LoadHint },
    /// The remote failed and its bundled routes were used instead.
    Fallback { routes: usize, reason: String },
    TimedOut { timeout_ms: u64 },
    NoRouteSource,
    Disabled,
}

/// Routes plus the status they were produced under.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub routes: Vec<AggregatedRoute>,
    pub status: RemoteStatus,
}

/// Loads and tags one remote's routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteLoader;

impl RouteLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load routes from `source`, tagging each with `remote_name`.
    ///
    /// Never fails: a failing source contributes an empty list.
    pub async fn load(&self, remote_name: &str, source: &dyn RouteSource) -> Vec<AggregatedRoute> {
        self.load_outcome(remote_name, source).await.routes
    }

    /// Same as [`RouteLoader::load`], keeping the per-remote status.
    pub async fn load_outcome(&self, remote_name: &str, source: &dyn RouteSource) -> LoadOutcome {
        let fetched = match AssertUnwindSafe(source.fetch()).catch_unwind().await {
            Ok(fetched) => fetched,
            Err(payload) => {
                let reason = format!("route source panicked: {}", panic_message(&*payload));
                warn!(
                    remote = %remote_name,
                    error = %reason,
                    hint = LoadHint::Crashed.remedy(),
                    "failed to load remote routes; remote contributes no routes"
                );
                return LoadOutcome {
                    routes: Vec::new(),
                    status: RemoteStatus::Degraded { reason, hint: LoadHint::Crashed },
                };
            }
        };
        match fetched {
            Ok(routes) => {
                debug!(remote = %remote_name, count = routes.len(), "remote routes loaded");
                let routes: Vec<AggregatedRoute> = routes
                    .into_iter()
                    .map(|r| r.owned_by(remote_name))
                    .collect();
                LoadOutcome { status: RemoteStatus::Loaded { routes: routes.len() }, routes }
            }
            Err(e) => {
                let hint = e.hint();
                warn!(
                    remote = %remote_name,
                    error = %e,
                    hint = hint.remedy(),
                    "failed to load remote routes; remote contributes no routes"
                );
                LoadOutcome { routes: Vec::new(), status: RemoteStatus::Degraded { reason: e.to_string(), hint } }
            }
        }
    }

    /// Substitute the bundled `fallback` list for a remote whose load ended
    /// with `reason`.
    #[must_use]
    pub fn fall_back(&self, remote_name: &str, reason: String, fallback: &[RouteDeclaration]) -> LoadOutcome {
        info!(remote = %remote_name, reason = %reason, "remote route export unavailable, using fallback routes");
        let routes: Vec<AggregatedRoute> = fallback.iter().cloned().map(|r| r.owned_by(remote_name)).collect();
        LoadOutcome { status: RemoteStatus::Fallback { routes: routes.len(), reason }, routes }
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
