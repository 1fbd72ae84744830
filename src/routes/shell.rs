//! Shell view and render routes.

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::remote::aggregate::AggregateReport;
use crate::remote::gateway::LoadingPlaceholder;
use crate::remote::{AggregatedRoute, RenderedOutput};
use crate::state::{NavEntry, ShellState};

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub brand: String,
    pub loading_routes: bool,
    pub nav: Vec<NavEntry>,
}

#[derive(Debug, Serialize)]
pub struct RoutesView {
    pub loading: bool,
    pub routes: Vec<AggregatedRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AggregateReport>,
}

#[derive(Debug, Serialize)]
pub struct NavView {
    pub loading: bool,
    pub entries: Vec<NavEntry>,
}

/// `GET /`: brand and navigation.
pub async fn home(State(state): State<ShellState>) -> Json<HomeView> {
    let (loading_routes, nav) = state.nav();
    Json(HomeView { brand: state.brand.clone(), loading_routes, nav })
}

/// `GET /api/routes`: aggregated route table plus per-remote report.
pub async fn list_routes(State(state): State<ShellState>) -> Json<RoutesView> {
    let table = state.routes.snapshot();
    Json(RoutesView {
        loading: table.is_loading(),
        routes: table.routes().to_vec(),
        report: table.report().cloned(),
    })
}

/// `GET /api/nav`: navigation entries in display order.
pub async fn nav(State(state): State<ShellState>) -> Json<NavView> {
    let (loading, entries) = state.nav();
    Json(NavView { loading, entries })
}

/// `GET /api/render?path=/x`: render the component routed at `/x`.
pub async fn render(
    State(state): State<ShellState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<RenderedOutput>, StatusCode> {
    render_path(&state, &query.path).await.map(Json)
}

/// `POST /api/render/retry?path=/x`: reset the route's scope and re-mount.
pub async fn retry(
    State(state): State<ShellState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<RenderedOutput>, StatusCode> {
    let table = state.routes.snapshot();
    if table.find(&query.path).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    match state.gateway.retry_route(&query.path).await {
        Some(output) => Ok(Json(output)),
        None => render_path(&state, &query.path).await.map(Json),
    }
}

/// Fallback: any other path is rendered if an aggregated route claims it.
pub async fn render_fallback(State(state): State<ShellState>, uri: Uri) -> Response {
    match render_path(&state, uri.path()).await {
        Ok(output) => Json(output).into_response(),
        Err(status) => status.into_response(),
    }
}

/// Render the route at `path` through its isolation scope.
///
/// While the route table is still loading every path renders the loading
/// placeholder, since any of them may yet be claimed by a remote.
pub(crate) async fn render_path(state: &ShellState, path: &str) -> Result<RenderedOutput, StatusCode> {
    let table = state.routes.snapshot();
    if table.is_loading() {
        return Ok(RenderedOutput::Loading(LoadingPlaceholder::default()));
    }
    let route = table.find(path).ok_or(StatusCode::NOT_FOUND)?;
    let handle = state.resolver.resolve(&route.remote_owner, &route.route.component_ref);
    Ok(state.gateway.render_route(path, handle).await)
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
