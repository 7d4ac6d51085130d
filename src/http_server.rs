use axum::{middleware, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    db_persistence::DbPersistence,
    metrics::{metrics_handler, track_metrics, Metrics},
    routes::api_routes,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPersistence>,
    pub config: Arc<Config>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// Create the HTTP server router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api_routes(state.clone()))
        .layer(middleware::from_fn(track_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        service: "NightPass".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn start_server(
    db: Arc<DbPersistence>,
    bind_address: &str,
    config: Arc<Config>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState {
        db,
        config,
        metrics: Arc::new(Metrics::new()),
    };
    let app = create_router(state);

    tracing::info!("Starting HTTP server on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
