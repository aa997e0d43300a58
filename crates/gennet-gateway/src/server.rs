//! HTTP server implementation using Axum.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use gennet_core::config::{GatewayConfig, GenNetConfig};
use gennet_knowledge::{KnowledgeStore, Retriever};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::assistant::Assistant;
use crate::error::panic_response;
use crate::sessions::SessionStore;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub config: GenNetConfig,
    pub assistant: Arc<Assistant>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: GenNetConfig, assistant: Arc<Assistant>) -> Self {
        Self {
            config,
            assistant,
            start_time: Instant::now(),
        }
    }

    /// Load knowledge, providers and sessions as described by `config`.
    pub async fn from_config(config: GenNetConfig) -> Self {
        let store = Arc::new(KnowledgeStore::from_config(&config.knowledge));
        let retriever = Arc::new(Retriever::from_config(store, &config.knowledge.embedding).await);
        let dispatcher = Arc::new(gennet_providers::create_dispatcher(&config.providers));
        let sessions = Arc::new(SessionStore::new(&config.sessions));

        tracing::info!(
            "📚 Knowledge: {} records, semantic search {}",
            retriever.store().len(),
            if retriever.semantic_available() { "on" } else { "off" }
        );
        tracing::info!(
            "🤖 Providers: {}/{} configured",
            dispatcher.configured_count(),
            dispatcher.providers().len()
        );
        if dispatcher.configured_count() == 0 {
            tracing::warn!("⚠️ No provider API keys found, /ask will report providers unavailable");
        }

        let assistant = Assistant::new(retriever, dispatcher, sessions, &config.providers, &config.knowledge);
        Self::new(config, Arc::new(assistant))
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    use crate::routes;

    let cors = cors_layer(&shared.config.gateway);

    Router::new()
        .route("/", get(routes::home))
        .route("/health", get(routes::health_check))
        .route("/status", get(routes::status))
        .route("/models", get(routes::list_models))
        .route("/ask", post(routes::ask))
        .route("/chat", post(routes::ask))
        .route("/search", post(routes::search))
        .fallback(routes::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Start the HTTP server.
pub async fn start(config: GenNetConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = AppState::from_config(config).await;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 GenNet gateway listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
