use super::*;
use crate::config::HttpTimeouts;
use crate::remote::{RenderedOutput, SHELL_OWNER};
use crate::remote::diagnostics::RemoteDiagnostics;
use axum::Router;
use axum::routing::get;
use std::time::Duration;

/// Manifest whose URL env vars carry `tag`, so parallel tests do not share them.
fn manifest(tag: &str) -> RemoteManifest {
    let raw = format!(
        r"
remotes:
  - name: todoApp
    url_env: __TEST_{tag}_TODO_URL__
    components: [App, Settings]
    fallback_routes:
      - path: /todo
        label: Todo List
        component: App
  - name: pantry
    url_env: __TEST_{tag}_PANTRY_URL__
    components: [Pantry]
  - name: retired
    url_env: __TEST_{tag}_RETIRED_URL__
    enabled: false
    components: [Old]
"
    );
    RemoteManifest::from_yaml(&raw).unwrap()
}

fn timeouts() -> HttpTimeouts {
    HttpTimeouts { request: Duration::from_secs(2), connect: Duration::from_secs(1) }
}

fn client() -> reqwest::Client {
    http_client(timeouts()).unwrap()
}

fn shell_config(manifest: RemoteManifest) -> ShellConfig {
    ShellConfig {
        port: 0,
        brand: "Test".into(),
        manifest,
        routes_timeout: Some(Duration::from_secs(1)),
        http: timeouts(),
        diagnostics: false,
    }
}

async fn spawn_remote(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serves routes and one component but no federation entry point.
fn remote_without_entry() -> Router {
    Router::new()
        .route(
            "/routes.json",
            get(|| async { r#"[{"path":"/todo","label":"Todo List","component":"App"},{"path":"/","label":"Takeover","component":"App"},{"path":"/healthz","label":"Health","component":"App"}]"# }),
        )
        .route("/components/App.json", get(|| async { r#"{"default":"<main>todo</main>"}"# }))
}

fn single_remote(var: &str) -> RemoteManifest {
    RemoteManifest::from_yaml(&format!("remotes:\n  - name: todoApp\n    url_env: {var}\n    components: [App]\n")).unwrap()
}

#[test]
fn build_entries_preserves_order_and_flags() {
    unsafe { std::env::set_var("__TEST_ENTRIES_TODO_URL__", "http://127.0.0.1:9/") };
    let entries = build_entries(&manifest("ENTRIES"), &client());
    unsafe { std::env::remove_var("__TEST_ENTRIES_TODO_URL__") };

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["todoApp", "pantry", "retired"]);

    assert!(entries[0].route_source.is_some());
    assert_eq!(entries[0].fallback_routes.as_ref().map(Vec::len), Some(1));
    assert!(entries[1].route_source.is_none());
    assert!(!entries[2].enabled);
}

#[test]
fn build_registry_only_covers_enabled_remotes_with_urls() {
    unsafe {
        std::env::set_var("__TEST_REGISTRY_PANTRY_URL__", "http://127.0.0.1:9");
        std::env::set_var("__TEST_REGISTRY_RETIRED_URL__", "http://127.0.0.1:9");
    }
    let registry = build_registry(&manifest("REGISTRY"), &client());
    unsafe {
        std::env::remove_var("__TEST_REGISTRY_PANTRY_URL__");
        std::env::remove_var("__TEST_REGISTRY_RETIRED_URL__");
    }

    assert_eq!(registry.remotes(), vec!["pantry"]);
    assert_eq!(registry.components("pantry"), vec!["Pantry"]);
}

#[test]
fn entry_urls_join_entry_path() {
    let raw = "remotes:\n  - name: shop\n    url_env: __TEST_STARTUP_SHOP_URL__\n  - name: nowhere\n    url_env: __TEST_STARTUP_NOWHERE_URL__\n";
    unsafe { std::env::set_var("__TEST_STARTUP_SHOP_URL__", "https://shop.example.com/") };
    let urls = entry_urls(&RemoteManifest::from_yaml(raw).unwrap());
    unsafe { std::env::remove_var("__TEST_STARTUP_SHOP_URL__") };

    assert_eq!(urls, vec![("shop".to_string(), "https://shop.example.com/assets/remoteEntry.js".to_string())]);
}

#[tokio::test]
async fn aggregation_task_publishes_fallback_routes() {
    let (state, entries) = build_shell(&ShellConfig {
        port: 0,
        brand: "Test".into(),
        manifest: manifest("SPAWN"),
        routes_timeout: Some(Duration::from_secs(1)),
        http: HttpTimeouts { request: Duration::from_secs(1), connect: Duration::from_secs(1) },
        diagnostics: false,
    })
    .unwrap();
    assert!(state.routes.snapshot().is_loading());

    spawn_route_aggregation(&state, entries, RouteAggregator::new(Some(Duration::from_secs(1))))
        .await
        .unwrap();

    let table = state.routes.snapshot();
    assert_eq!(table.routes().len(), 1);
    assert_eq!(table.find("/todo").unwrap().remote_owner, "todoApp");
}

#[tokio::test]
async fn diagnostics_task_completes_without_remotes() {
    let handle = spawn_diagnostics(&RemoteManifest::default(), timeouts()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn diagnostics_task_honors_configured_http_timeouts() {
    let stalled = Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        "late"
    });
    let base = spawn_remote(stalled).await;
    unsafe { std::env::set_var("__TEST_STALLED_TODO_URL__", &base) };
    let manifest = single_remote("__TEST_STALLED_TODO_URL__");
    let short = HttpTimeouts { request: Duration::from_millis(200), connect: Duration::from_millis(200) };
    let handle = spawn_diagnostics(&manifest, short).unwrap();
    unsafe { std::env::remove_var("__TEST_STALLED_TODO_URL__") };

    let finished = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(finished, Ok(Ok(()))));
}

#[test]
fn route_aggregator_reserves_shell_paths() {
    let aggregator = route_aggregator(&shell_config(RemoteManifest::default()));
    assert!(aggregator.is_reserved("/"));
    assert!(aggregator.is_reserved("/healthz"));
    assert!(aggregator.is_reserved("/api/nav"));
    assert!(!aggregator.is_reserved("/todo"));
}

#[tokio::test]
async fn remote_routes_on_shell_paths_are_dropped_from_table_and_nav() {
    let base = spawn_remote(remote_without_entry()).await;
    unsafe { std::env::set_var("__TEST_RESERVED_TODO_URL__", &base) };
    let config = shell_config(single_remote("__TEST_RESERVED_TODO_URL__"));
    let (state, entries) = build_shell(&config).unwrap();
    unsafe { std::env::remove_var("__TEST_RESERVED_TODO_URL__") };

    spawn_route_aggregation(&state, entries, route_aggregator(&config)).await.unwrap();

    let table = state.routes.snapshot();
    let paths: Vec<&str> = table.routes().iter().map(|r| r.path()).collect();
    assert_eq!(paths, vec!["/todo"]);
    let collisions = &table.report().unwrap().collisions;
    assert_eq!(collisions.len(), 2);
    assert!(collisions.iter().all(|c| c.kept_owner == SHELL_OWNER && c.dropped_owner == "todoApp"));

    let (_, nav) = state.nav();
    assert_eq!(nav.iter().filter(|entry| entry.to == "/").count(), 1);
    assert_eq!(nav[0].label, "Home");
}

#[tokio::test]
async fn failing_diagnostics_leave_routes_and_rendering_untouched() {
    let base = spawn_remote(remote_without_entry()).await;
    unsafe { std::env::set_var("__TEST_ADVISORY_TODO_URL__", &base) };
    let config = shell_config(single_remote("__TEST_ADVISORY_TODO_URL__"));
    let (state, entries) = build_shell(&config).unwrap();
    let urls = entry_urls(&config.manifest);
    unsafe { std::env::remove_var("__TEST_ADVISORY_TODO_URL__") };

    let aggregator = route_aggregator(&config);
    let before = aggregator.aggregate(&entries).await;

    let reports = RemoteDiagnostics::from_client(client()).diagnose_all(&urls).await;
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].probe.is_working());

    let after = aggregator.aggregate(&entries).await;
    assert_eq!(before, after);
    assert_eq!(after.len(), 1);

    let handle = state.resolver.resolve("todoApp", "App");
    let RenderedOutput::Ready(view) = state.gateway.render(handle).await else {
        panic!("expected the component to render");
    };
    assert_eq!(view.markup, "<main>todo</main>");
}
