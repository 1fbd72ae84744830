//! Render gateway: per-component failure isolation.
//!
//! DESIGN
//! ======
//! Every rendered remote component gets its own `IsolationScope`, a small
//! state machine with three states:
//!
//! ```text
//!   Loading ──ok──▶ Ready
//!      │
//!      └──err/panic──▶ Failed ──reset──▶ Loading
//! ```
//!
//! A scope catches load errors, render errors, and panics from remote code,
//! logs them with a classified hint, and turns them into a bounded error
//! placeholder. Nothing escapes a scope, so one broken remote component
//! cannot affect a sibling scope or the shell.
//!
//! The gateway keeps one scope per routed path. While a scope is mounting,
//! concurrent readers observe the loading placeholder instead of waiting.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use super::error::{LoadHint, panic_message};
use super::handle::ComponentHandle;
use super::types::RenderContext;

pub const DEFAULT_LOADING_MESSAGE: &str = "Loading module...";
pub const DEFAULT_ERROR_TITLE: &str = "Something went wrong";
pub const DEFAULT_ERROR_MESSAGE: &str = "This module could not be loaded.";

// =============================================================================
// PLACEHOLDERS
// =============================================================================

/// Shown while a remote component is loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadingPlaceholder {
    pub message: String,
}

impl Default for LoadingPlaceholder {
    fn default() -> Self {
        Self { message: DEFAULT_LOADING_MESSAGE.to_string() }
    }
}

/// Bounded error shown in place of a failed remote component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPlaceholder {
    pub title: String,
    pub message: String,
    pub details: Option<String>,
    pub remote: String,
    pub component: String,
    pub hint: LoadHint,
    pub retryable: bool,
}

/// Markup produced by a successfully mounted component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadyView {
    pub remote: String,
    pub component: String,
    pub markup: String,
}

/// What a scope shows right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RenderedOutput {
    Loading(LoadingPlaceholder),
    Ready(ReadyView),
    Failed(ErrorPlaceholder),
}

impl RenderedOutput {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

// =============================================================================
// SCOPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFailure {
    pub message: String,
    pub hint: LoadHint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeState {
    Loading,
    Ready(String),
    Failed(ScopeFailure),
}

/// Independent loading/ready/failed lifecycle for one rendered component.
#[derive(Debug)]
pub struct IsolationScope {
    id: Uuid,
    handle: ComponentHandle,
    ctx: RenderContext,
    state: ScopeState,
    attempts: u32,
}

impl IsolationScope {
    #[must_use]
    pub fn new(handle: ComponentHandle, ctx: RenderContext) -> Self {
        Self { id: Uuid::new_v4(), handle, ctx, state: ScopeState::Loading, attempts: 0 }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &ScopeState {
        &self.state
    }

    /// Number of mount attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Mount the component if the scope is still loading; otherwise return
    /// the settled output unchanged. `Failed` only leaves via [`Self::reset`].
    pub async fn mount(&mut self) -> RenderedOutput {
        if self.state == ScopeState::Loading {
            self.state = self.attempt().await;
        }
        self.output()
    }

    /// Move a failed scope back to `Loading`. Returns false if not failed.
    pub fn reset(&mut self) -> bool {
        if matches!(self.state, ScopeState::Failed(_)) {
            debug!(scope = %self.id, key = %self.handle.key(), "isolation scope reset");
            self.state = ScopeState::Loading;
            true
        } else {
            false
        }
    }

    /// Reset and mount again.
    pub async fn retry(&mut self) -> RenderedOutput {
        self.reset();
        self.mount().await
    }

    #[must_use]
    pub fn output(&self) -> RenderedOutput {
        let key = self.handle.key();
        match &self.state {
            ScopeState::Loading => RenderedOutput::Loading(LoadingPlaceholder::default()),
            ScopeState::Ready(markup) => RenderedOutput::Ready(ReadyView {
                remote: key.remote.clone(),
                component: key.component.clone(),
                markup: markup.clone(),
            }),
            ScopeState::Failed(failure) => RenderedOutput::Failed(ErrorPlaceholder {
                title: DEFAULT_ERROR_TITLE.to_string(),
                message: DEFAULT_ERROR_MESSAGE.to_string(),
                details: Some(failure.message.clone()),
                remote: key.remote.clone(),
                component: key.component.clone(),
                hint: failure.hint,
                retryable: true,
            }),
        }
    }

    async fn attempt(&mut self) -> ScopeState {
        self.attempts += 1;
        let key = self.handle.key().clone();

        let loaded = AssertUnwindSafe(self.handle.load()).catch_unwind().await;
        let component = match loaded {
            Ok(Ok(component)) => component,
            Ok(Err(e)) => return self.fail(e.to_string(), e.hint()),
            Err(payload) => return self.fail(format!("panicked while loading: {}", panic_message(&*payload)), LoadHint::Crashed),
        };

        let ctx = &self.ctx;
        match std::panic::catch_unwind(AssertUnwindSafe(|| component.render(ctx))) {
            Ok(Ok(markup)) => {
                debug!(scope = %self.id, key = %key, "remote component mounted");
                ScopeState::Ready(markup)
            }
            Ok(Err(e)) => self.fail(e.to_string(), LoadHint::Crashed),
            Err(payload) => self.fail(format!("panicked while rendering: {}", panic_message(&*payload)), LoadHint::Crashed),
        }
    }

    fn fail(&self, message: String, hint: LoadHint) -> ScopeState {
        let key = self.handle.key();
        error!(
            scope = %self.id,
            remote = %key.remote,
            component = %key.component,
            attempt = self.attempts,
            error = %message,
            hint = hint.remedy(),
            "remote component failed; contained in its isolation scope"
        );
        ScopeState::Failed(ScopeFailure { message, hint })
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

type SharedScope = Arc<tokio::sync::Mutex<IsolationScope>>;

/// Wraps each rendered component in its own isolation scope.
#[derive(Default)]
pub struct RenderGateway {
    routes: Mutex<HashMap<String, SharedScope>>,
}

impl RenderGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `handle` in a fresh scope. Never fails.
    pub async fn render(&self, handle: ComponentHandle) -> RenderedOutput {
        IsolationScope::new(handle, RenderContext::default()).mount().await
    }

    /// Render several handles concurrently, one scope each, in input order.
    pub async fn render_all(&self, handles: Vec<ComponentHandle>) -> Vec<RenderedOutput> {
        join_all(handles.into_iter().map(|h| self.render(h))).await
    }

    /// Render the component routed at `path` in that route's scope.
    ///
    /// Returns the loading placeholder if the scope is mid-mount.
    pub async fn render_route(&self, path: &str, handle: ComponentHandle) -> RenderedOutput {
        let scope = self.scope_for(path, handle);
        let Ok(mut scope) = scope.try_lock() else {
            return RenderedOutput::Loading(LoadingPlaceholder::default());
        };
        scope.mount().await
    }

    /// Reset the scope routed at `path` and mount it again.
    ///
    /// Returns `None` when nothing has been rendered at `path` yet.
    pub async fn retry_route(&self, path: &str) -> Option<RenderedOutput> {
        let scope = {
            let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(routes.get(path)?)
        };
        let mut scope = scope.lock().await;
        Some(scope.retry().await)
    }

    fn scope_for(&self, path: &str, handle: ComponentHandle) -> SharedScope {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let scope = routes.entry(path.to_string()).or_insert_with(|| {
            let ctx = RenderContext { path: path.to_string() };
            Arc::new(tokio::sync::Mutex::new(IsolationScope::new(handle, ctx)))
        });
        Arc::clone(scope)
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
