//! Outage Intelligence Dashboard Server
//!
//! Predictive risk dashboard for maritime, offshore and gas pipeline
//! equipment. Operators submit 15 sensor readings (or a CSV of many rows)
//! and get a risk score, a severity class and an outage type back from
//! pre-trained model artifacts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 OUTAGE INTELLIGENCE DASHBOARD               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │ Dashboard │  │ JSON/CSV  │  │  Feature Importance     │ │
//! │  │  (HTML)   │  │   API     │  │  (risk model)           │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │     scaler → risk / severity / outage → label decoders      │
//! │                       ▼                                     │
//! │            ┌─────────────────────┐                          │
//! │            │ Model Store (Arc)   │                          │
//! │            └─────────────────────┘                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod constants;
mod error;
mod handlers;
mod logic;
mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use config::LogFormat;
use logic::model::{ModelStore, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let json = config.log_format == LogFormat::Json;
    let default_filter = if config.is_production() {
        "outage_dashboard=info,tower_http=info"
    } else {
        "outage_dashboard=debug,tower_http=debug"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("{} v{} starting...", constants::APP_NAME, constants::APP_VERSION);
    tracing::info!(
        environment = %config.environment,
        weighting = %config.feature_weighting,
        "Configuration loaded"
    );

    // Model store: missing or incompatible artifacts abort startup
    let store = ModelStore::load(&config.model_dir).with_context(|| {
        format!("failed to load model store from {}", config.model_dir.display())
    })?;

    let state = AppState {
        pipeline: Pipeline::new(Arc::new(store), config.feature_weighting),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Dashboard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    // Dashboard pages
    let pages = Router::new()
        .route("/", get(handlers::dashboard::index))
        .route("/predict", post(handlers::dashboard::predict))
        .route("/batch", post(handlers::dashboard::batch));

    // JSON / CSV API
    let api = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/features", get(handlers::api::features))
        .route("/api/v1/models", get(handlers::api::models))
        .route("/api/v1/importance", get(handlers::api::importance))
        .route("/api/v1/predict", post(handlers::api::predict))
        .route("/api/v1/predict/batch", post(handlers::api::predict_batch))
        .route("/api/v1/predict/batch.csv", post(handlers::api::predict_batch_csv))
        .route("/api/v1/template.csv", get(handlers::api::template));

    Router::new()
        .merge(pages)
        .merge(api)
        .layer(DefaultBodyLimit::max(upload_limit))
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
