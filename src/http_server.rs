/// HTTP server for the AI Travel Planner
/// Serves the trip form and a JSON endpoint backed by the hosted agent

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use travel_planner::{build_planner, init_tracing, web, PlannerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenv::dotenv();
    init_tracing();

    let config = PlannerConfig::from_env().context("failed to load configuration")?;
    let planner = build_planner(&config)?;

    let shutdown = CancellationToken::new();
    let app = web::router(web::AppState {
        planner,
        shutdown: shutdown.clone(),
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.http_port))?;

    tracing::info!(port = config.http_port, "travel planner listening");
    tracing::info!("  GET  /               trip form");
    tracing::info!("  POST /itinerary      form submission");
    tracing::info!("  POST /api/itinerary  JSON submission");
    tracing::info!("  GET  /health         health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested; cancelling in-flight requests");
            shutdown.cancel();
        })
        .await
        .context("server failed")?;

    Ok(())
}
