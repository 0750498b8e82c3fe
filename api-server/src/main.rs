//! MindBloom Triage Server
//!
//! HTTP surface over the postpartum-depression risk triage engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MINDBLOOM SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────┐  ┌──────────────────┐  │
//! │  │  API      │  │  Triage Engine  │  │  Feedback Loop   │  │
//! │  │  (Axum)   │─▶│  derive/predict │  │  outcomes +      │  │
//! │  │           │  │  /explain       │  │  follow-ups      │  │
//! │  └─────┬─────┘  └─────────────────┘  └────────┬─────────┘  │
//! │        └──────────────────┬────────────────────┘            │
//! │                           ▼                                 │
//! │                    ┌─────────────┐                          │
//! │                    │   SQLite    │                          │
//! │                    └─────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod chat;
mod config;
mod db;
mod error;
mod feedback_loop;
mod handlers;
mod models;


use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mindbloom_core::logic::dataset::DatasetWriter;
use mindbloom_core::TriageEngine;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "mindbloom_server=debug,mindbloom_core=info,tower_http=debug".into()),
    );
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("MindBloom server starting ({})", config.environment);
    tracing::info!("Model artifact: {}", config.model_path);

    // A missing or malformed model is fatal
    let engine_config = config.engine_config();
    let engine = tokio::task::spawn_blocking(move || TriageEngine::load(&engine_config)).await??;

    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await?;

    let state = AppState::new(engine, pool, config.clone());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TriageEngine>,
    pub feedback: feedback_loop::FeedbackLoop,
    pub chat: Arc<chat::ChatBackend>,
    pub config: config::Config,
}

impl AppState {
    pub fn new(engine: TriageEngine, pool: sqlx::SqlitePool, config: config::Config) -> Self {
        let dataset = DatasetWriter::from_path(Path::new(&config.export_dir).join("dataset"));
        let feedback = feedback_loop::FeedbackLoop::new(pool, config.follow_up_days, config.follow_up_method.clone())
            .with_dataset(dataset);

        Self {
            engine: Arc::new(engine),
            feedback,
            chat: Arc::new(chat::ChatBackend::from_config(&config.llm)),
            config,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/schema", get(handlers::schema::get))
        .route("/api/v1/model", get(handlers::model::status))
        .route("/api/v1/predict", post(handlers::predict::predict))
        .route("/api/v1/feedback", post(handlers::feedback::submit))
        .route(
            "/api/v1/follow-ups/:session_id/complete",
            post(handlers::feedback::complete_follow_up),
        )
        .route("/api/v1/chat", post(handlers::chat::reply));

    let admin_routes = Router::new()
        .route("/api/v1/admin/follow-ups/pending", get(handlers::admin::pending_follow_ups))
        .route("/api/v1/admin/stats", get(handlers::admin::stats))
        .route("/api/v1/admin/export", post(handlers::admin::export));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .merge(admin_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
