use axum::{
    routing::{get, post},
    Router,
};
use gateway::{GatewayConfig, InferenceGateway};
use session::InteractionController;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod sessions;

pub use config::AppConfig;

use metrics::Metrics;
use sessions::SessionStore;

pub struct AppState {
    pub gateway_config: Arc<GatewayConfig>,
    pub controller: InteractionController<InferenceGateway>,
    pub sessions: SessionStore,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let gateway_config = Arc::new(config.gateway.clone());
        let gateway = InferenceGateway::new(gateway_config.clone())?;

        Ok(Self {
            gateway_config,
            controller: InteractionController::new(Arc::new(gateway), config.controller.clone()),
            sessions: SessionStore::new(config.max_sessions),
            metrics: Metrics::new(),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/options", get(handlers::get_options))
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/:id/extract", post(handlers::extract))
        .route("/api/sessions/:id/generate", post(handlers::generate))
        .route("/api/sessions/:id/summarize", post(handlers::summarize))
        .route("/api/sessions/:id/clear", post(handlers::clear))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
