//! Shared shell state.
//!
//! DESIGN
//! ======
//! `ShellState` is injected into Axum handlers via the `State` extractor.
//! The route table starts out `Loading` and is published exactly once when
//! aggregation finishes; after that it is read-only. Readers either take a
//! snapshot or await the transition through the underlying watch channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::warn;

use crate::remote::aggregate::AggregateReport;
use crate::remote::{AggregatedRoute, RemoteComponentResolver, RenderGateway};

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Debug, Clone)]
pub enum RouteTableState {
    Loading,
    Loaded(Arc<AggregateReport>),
}

impl RouteTableState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Routes in table order; empty while loading.
    #[must_use]
    pub fn routes(&self) -> &[AggregatedRoute] {
        match self {
            Self::Loading => &[],
            Self::Loaded(report) => &report.routes,
        }
    }

    #[must_use]
    pub fn report(&self) -> Option<&AggregateReport> {
        match self {
            Self::Loading => None,
            Self::Loaded(report) => Some(report),
        }
    }

    #[must_use]
    pub fn find(&self, path: &str) -> Option<&AggregatedRoute> {
        self.routes().iter().find(|r| r.path() == path)
    }
}

/// Write-once route table.
#[derive(Clone)]
pub struct RouteTable {
    tx: Arc<watch::Sender<RouteTableState>>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RouteTableState::Loading);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn snapshot(&self) -> RouteTableState {
        self.tx.borrow().clone()
    }

    /// Publish the aggregated table. Returns false if already published.
    pub fn publish(&self, report: AggregateReport) -> bool {
        let report = Arc::new(report);
        let published = self.tx.send_if_modified(|state| {
            if state.is_loading() {
                *state = RouteTableState::Loaded(Arc::clone(&report));
                true
            } else {
                false
            }
        });
        if !published {
            warn!("route table already published; ignoring second publish");
        }
        published
    }

    /// Wait until the table is loaded and return it.
    pub async fn wait_loaded(&self) -> Arc<AggregateReport> {
        let mut rx = self.tx.subscribe();
        loop {
            if let RouteTableState::Loaded(report) = &*rx.borrow_and_update() {
                return Arc::clone(report);
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                return Arc::new(AggregateReport::default());
            }
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub to: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NavEntry {
    #[must_use]
    pub fn new(to: &str, label: &str) -> Self {
        Self { to: to.to_string(), label: label.to_string(), icon: None }
    }
}

/// Static entries first, then aggregated routes shown in navigation.
#[must_use]
pub fn build_nav(static_entries: &[NavEntry], routes: &[AggregatedRoute]) -> Vec<NavEntry> {
    static_entries
        .iter()
        .cloned()
        .chain(routes.iter().filter(|r| r.route.show_in_nav).map(|r| NavEntry {
            to: r.route.path.clone(),
            label: r.route.label.clone(),
            icon: r.route.icon.clone(),
        }))
        .collect()
}

// =============================================================================
// SHELL STATE
// =============================================================================

/// Shared shell state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct ShellState {
    pub brand: String,
    pub routes: RouteTable,
    pub resolver: Arc<RemoteComponentResolver>,
    pub gateway: Arc<RenderGateway>,
    pub static_nav: Vec<NavEntry>,
}

impl ShellState {
    #[must_use]
    pub fn new(brand: String, resolver: Arc<RemoteComponentResolver>) -> Self {
        Self {
            brand,
            routes: RouteTable::new(),
            resolver,
            gateway: Arc::new(RenderGateway::new()),
            static_nav: vec![NavEntry::new("/", "Home")],
        }
    }

    #[must_use]
    pub fn nav(&self) -> (bool, Vec<NavEntry>) {
        let table = self.routes.snapshot();
        (table.is_loading(), build_nav(&self.static_nav, table.routes()))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
