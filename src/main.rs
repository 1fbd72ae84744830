use remote_shell::config::ShellConfig;
use remote_shell::{routes, startup};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ShellConfig::from_env().expect("invalid shell configuration");
    let (state, entries) = startup::build_shell(&config).expect("shell init failed");

    // Route aggregation runs in the background; the table reports loading until it publishes.
    let _aggregation = startup::spawn_route_aggregation(&state, entries, startup::route_aggregator(&config));

    if config.diagnostics {
        let _diagnostics = startup::spawn_diagnostics(&config.manifest, config.http);
    }

    let port = config.port;
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "remote shell listening");
    axum::serve(listener, app).await.expect("server failed");
}
