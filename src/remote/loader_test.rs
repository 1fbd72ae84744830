use super::*;

struct FailingSource(RouteSourceError);

#[async_trait::async_trait]
impl RouteSource for FailingSource {
    async fn fetch(&self) -> Result<Vec<RouteDeclaration>, RouteSourceError> {
        Err(self.0.clone())
    }
}

fn todo_routes() -> Vec<RouteDeclaration> {
    vec![
        RouteDeclaration::new("/todo", "Todo List", "App"),
        RouteDeclaration::new("/todo/settings", "Settings", "Settings").hidden(),
    ]
}

#[tokio::test]
async fn load_tags_each_route_with_owner() {
    let routes = RouteLoader::new().load("todoApp", &StaticRoutes(todo_routes())).await;
    assert_eq!(routes.len(), 2);
    assert!(routes.iter().all(|r| r.remote_owner == "todoApp"));
    assert_eq!(routes[0].path(), "/todo");
    assert_eq!(routes[1].path(), "/todo/settings");
    assert!(!routes[1].route.show_in_nav);
}

#[tokio::test]
async fn load_empty_list_is_not_an_error() {
    let outcome = RouteLoader::new().load_outcome("empty", &StaticRoutes(Vec::new())).await;
    assert!(outcome.routes.is_empty());
    assert_eq!(outcome.status, RemoteStatus::Loaded { routes: 0 });
}

#[tokio::test]
async fn load_failure_degrades_to_empty() {
    let source = FailingSource(RouteSourceError::Unreachable("connection refused".into()));
    let outcome = RouteLoader::new().load_outcome("broken", &source).await;
    assert!(outcome.routes.is_empty());
    let RemoteStatus::Degraded { reason, hint } = outcome.status else {
        panic!("expected degraded status");
    };
    assert!(reason.contains("connection refused"));
    assert_eq!(hint, LoadHint::Network);
}

#[tokio::test]
async fn load_malformed_export_degrades_with_malformed_hint() {
    let source = FailingSource(RouteSourceError::Malformed("expected a sequence".into()));
    let outcome = RouteLoader::new().load_outcome("broken", &source).await;
    assert!(matches!(outcome.status, RemoteStatus::Degraded { hint: LoadHint::Malformed, .. }));
}

struct PanickingSource;

#[async_trait::async_trait]
impl RouteSource for PanickingSource {
    async fn fetch(&self) -> Result<Vec<RouteDeclaration>, RouteSourceError> {
        panic!("route export blew up")
    }
}

#[tokio::test]
async fn panicking_source_degrades_with_crashed_hint() {
    let outcome = RouteLoader::new().load_outcome("boom", &PanickingSource).await;
    assert!(outcome.routes.is_empty());
    let RemoteStatus::Degraded { reason, hint } = outcome.status else {
        panic!("expected degraded status");
    };
    assert!(reason.contains("route export blew up"));
    assert_eq!(hint, LoadHint::Crashed);
}

#[test]
fn fall_back_tags_bundled_routes_and_keeps_reason() {
    let outcome = RouteLoader::new().fall_back("todoApp", "missing export".into(), &todo_routes());
    assert_eq!(outcome.routes.len(), 2);
    assert!(outcome.routes.iter().all(|r| r.remote_owner == "todoApp"));
    assert_eq!(outcome.status, RemoteStatus::Fallback { routes: 2, reason: "missing export".into() });
}

#[test]
fn fallback_status_serializes_with_reason() {
    let status = RemoteStatus::Fallback { routes: 2, reason: "timed out after 50 ms".into() };
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["status"], "fallback");
    assert_eq!(value["routes"], 2);
    assert_eq!(value["reason"], "timed out after 50 ms");
}
