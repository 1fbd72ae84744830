use super::*;
use crate::remote::error::{ComponentLoadError, RenderError};
use crate::remote::registry::ModuleLoader;
use crate::remote::types::{ComponentKey, FragmentComponent, RemoteComponent, RemoteModule};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// =========================================================================
// Test components
// =========================================================================

struct ThrowingComponent;

impl RemoteComponent for ThrowingComponent {
    fn render(&self, _ctx: &RenderContext) -> Result<String, RenderError> {
        Err(RenderError::new("cannot read properties of undefined"))
    }
}

struct PanickingComponent;

impl RemoteComponent for PanickingComponent {
    fn render(&self, _ctx: &RenderContext) -> Result<String, RenderError> {
        panic!("remote render blew up")
    }
}

/// Echoes the routed path so tests can see the scope's context.
struct PathEcho;

impl RemoteComponent for PathEcho {
    fn render(&self, ctx: &RenderContext) -> Result<String, RenderError> {
        Ok(format!("<p>{}</p>", ctx.path))
    }
}

fn handle_for(component: &str, module: impl Fn() -> RemoteModule + Send + Sync + 'static) -> ComponentHandle {
    let module = Arc::new(module);
    let loader: ModuleLoader = Arc::new(move || {
        let module = Arc::clone(&module);
        async move { Ok::<_, ComponentLoadError>(module()) }.boxed()
    });
    ComponentHandle::deferred(ComponentKey::new("shop", component), loader, false)
}

/// Fails the first `failures` loads, then serves a fragment.
fn flaky_handle(calls: Arc<AtomicUsize>, failures: usize) -> ComponentHandle {
    let loader: ModuleLoader = Arc::new(move || {
        let calls = Arc::clone(&calls);
        async move {
            if calls.fetch_add(1, Ordering::SeqCst) < failures {
                return Err(ComponentLoadError::Status { status: 502 });
            }
            Ok(RemoteModule::with_default(Arc::new(FragmentComponent::new("<p>back</p>"))))
        }
        .boxed()
    });
    ComponentHandle::deferred(ComponentKey::new("shop", "Flaky"), loader, false)
}

fn slow_handle(delay_ms: u64) -> ComponentHandle {
    let loader: ModuleLoader = Arc::new(move || {
        async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok::<_, ComponentLoadError>(RemoteModule::with_default(Arc::new(FragmentComponent::new("<p>slow</p>"))))
        }
        .boxed()
    });
    ComponentHandle::deferred(ComponentKey::new("shop", "Slow"), loader, false)
}

// =========================================================================
// IsolationScope
// =========================================================================

#[tokio::test]
async fn scope_starts_loading_and_mounts_ready() {
    let handle = handle_for("Cart", || RemoteModule::with_default(Arc::new(FragmentComponent::new("<p>cart</p>"))));
    let mut scope = IsolationScope::new(handle, RenderContext::default());
    assert_eq!(scope.state(), &ScopeState::Loading);
    assert!(matches!(scope.output(), RenderedOutput::Loading(_)));

    let output = scope.mount().await;
    let RenderedOutput::Ready(view) = output else {
        panic!("expected ready output");
    };
    assert_eq!(view.markup, "<p>cart</p>");
    assert_eq!(view.component, "Cart");
    assert_eq!(scope.attempts(), 1);
}

#[tokio::test]
async fn render_error_is_contained() {
    let mut scope = IsolationScope::new(
        handle_for("Broken", || RemoteModule::with_default(Arc::new(ThrowingComponent))),
        RenderContext::default(),
    );
    let RenderedOutput::Failed(placeholder) = scope.mount().await else {
        panic!("expected failed output");
    };
    assert_eq!(placeholder.title, DEFAULT_ERROR_TITLE);
    assert_eq!(placeholder.hint, LoadHint::Crashed);
    assert!(placeholder.retryable);
    assert!(placeholder.details.unwrap().contains("undefined"));
}

#[tokio::test]
async fn render_panic_is_contained() {
    let mut scope = IsolationScope::new(
        handle_for("Panics", || RemoteModule::with_default(Arc::new(PanickingComponent))),
        RenderContext::default(),
    );
    let RenderedOutput::Failed(placeholder) = scope.mount().await else {
        panic!("expected failed output");
    };
    assert!(placeholder.details.unwrap().contains("remote render blew up"));
}

#[tokio::test]
async fn missing_export_fails_with_hint() {
    let mut scope = IsolationScope::new(handle_for("Cart", RemoteModule::default), RenderContext::default());
    let output = scope.mount().await;
    let RenderedOutput::Failed(placeholder) = output else {
        panic!("expected failed output");
    };
    assert_eq!(placeholder.hint, LoadHint::MissingExport);
}

#[tokio::test]
async fn failed_scope_stays_failed_until_reset() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut scope = IsolationScope::new(flaky_handle(Arc::clone(&calls), 1), RenderContext::default());

    assert!(scope.mount().await.is_failed());
    assert!(scope.mount().await.is_failed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(scope.reset());
    assert_eq!(scope.state(), &ScopeState::Loading);
    assert!(scope.mount().await.is_ready());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(scope.attempts(), 2);
}

#[tokio::test]
async fn reset_is_noop_unless_failed() {
    let mut scope = IsolationScope::new(
        handle_for("Cart", || RemoteModule::with_default(Arc::new(FragmentComponent::new("x")))),
        RenderContext::default(),
    );
    assert!(!scope.reset());
    scope.mount().await;
    assert!(!scope.reset());
    assert!(scope.output().is_ready());
}

#[tokio::test]
async fn retry_reattempts_failed_scope() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut scope = IsolationScope::new(flaky_handle(Arc::clone(&calls), 2), RenderContext::default());
    assert!(scope.mount().await.is_failed());
    assert!(scope.retry().await.is_failed());
    assert!(scope.retry().await.is_ready());
}

// =========================================================================
// RenderGateway
// =========================================================================

#[tokio::test]
async fn sibling_failure_does_not_affect_success() {
    let gateway = RenderGateway::new();
    let outputs = gateway
        .render_all(vec![
            handle_for("Broken", || RemoteModule::with_default(Arc::new(ThrowingComponent))),
            handle_for("Cart", || RemoteModule::with_default(Arc::new(FragmentComponent::new("<p>cart</p>")))),
            handle_for("Panics", || RemoteModule::with_default(Arc::new(PanickingComponent))),
        ])
        .await;
    assert!(outputs[0].is_failed());
    assert!(outputs[1].is_ready());
    assert!(outputs[2].is_failed());
}

#[tokio::test]
async fn route_scope_receives_path_and_is_reused() {
    let gateway = RenderGateway::new();
    let handle = handle_for("Echo", || RemoteModule::with_default(Arc::new(PathEcho)));
    let RenderedOutput::Ready(view) = gateway.render_route("/todo", handle.clone()).await else {
        panic!("expected ready output");
    };
    assert_eq!(view.markup, "<p>/todo</p>");
    assert!(gateway.render_route("/todo", handle).await.is_ready());
}

#[tokio::test]
async fn retry_route_recovers_failed_route() {
    let gateway = RenderGateway::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = flaky_handle(Arc::clone(&calls), 1);
    assert!(gateway.render_route("/flaky", handle.clone()).await.is_failed());
    assert!(gateway.render_route("/flaky", handle).await.is_failed());
    assert!(gateway.retry_route("/flaky").await.unwrap().is_ready());
}

#[tokio::test]
async fn retry_route_unknown_path_is_none() {
    let gateway = RenderGateway::new();
    assert!(gateway.retry_route("/nowhere").await.is_none());
}

#[tokio::test]
async fn concurrent_route_reader_sees_loading() {
    let gateway = Arc::new(RenderGateway::new());
    let handle = slow_handle(100);

    let mounting = {
        let gateway = Arc::clone(&gateway);
        let handle = handle.clone();
        tokio::spawn(async move { gateway.render_route("/slow", handle).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let observed = gateway.render_route("/slow", handle.clone()).await;
    assert!(matches!(observed, RenderedOutput::Loading(_)));
    assert!(mounting.await.unwrap().is_ready());
    assert!(gateway.render_route("/slow", handle).await.is_ready());
}

#[test]
fn output_serializes_with_state_tag() {
    let value = serde_json::to_value(RenderedOutput::Loading(LoadingPlaceholder::default())).unwrap();
    assert_eq!(value["state"], "loading");
    assert_eq!(value["message"], DEFAULT_LOADING_MESSAGE);
}
