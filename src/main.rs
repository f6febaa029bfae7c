use axum::Router;
use randobreizh::config::{mask_secret, Config};
use randobreizh::services::route_generator::RouteGenerator;
use randobreizh::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "randobreizh=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting RandoBreizh route server");
    tracing::info!(
        ors_base_url = %config.ors_base_url,
        max_attempts = config.convergence.max_attempts,
        tolerance_pct = config.convergence.tolerance_pct,
        "Configuration loaded successfully"
    );

    let route_generator = RouteGenerator::from_config(&config)?;

    let state = Arc::new(AppState {
        route_generator,
        ors_key_hint: mask_secret(&config.ors_api_key),
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", randobreizh::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
