//! Income Prediction Web Server
//!
//! Serves the prediction form, the analysis page with its charts, and the
//! JSON `/predict` endpoint backed by the trained model or, when no model
//! file exists, by demographic rules.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fallback::FallbackEngine;
use inference_engine::InferenceEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod routes;
mod settings;

pub use error::ApiError;
pub use settings::{ServerConfig, DEFAULT_CONFIG_PATH};

/// State handle passed to every handler
pub type SharedState = Arc<RwLock<AppState>>;

/// Prediction counts since startup
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionCounters {
    pub model_predictions: u64,
    pub fallback_predictions: u64,
    /// Model answers changed by the young-worker override
    pub overrides: u64,
}

/// Application state shared across handlers
pub struct AppState {
    /// Model-backed predictor
    pub engine: InferenceEngine,
    /// Rule-based predictor and override
    pub fallback: FallbackEngine,
    pub config: ServerConfig,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    pub counters: PredictionCounters,
    /// Installed Prometheus recorder, if any
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state reading the model from `config.model_path`
    pub fn new(config: ServerConfig, metrics: Option<PrometheusHandle>) -> Self {
        let engine = InferenceEngine::new(&config.model_path);
        Self::with_engine(engine, config, metrics)
    }

    /// Create state around an existing engine
    pub fn with_engine(
        engine: InferenceEngine,
        config: ServerConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            engine,
            fallback: FallbackEngine::new(),
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            counters: PredictionCounters::default(),
            metrics,
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model_loaded: bool,
    pub predictions: PredictionCounters,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let with_metrics = state.metrics.is_some();

    let mut router = Router::new()
        .route("/", get(routes::pages::index))
        .route("/analysis", get(routes::pages::analysis))
        .route("/predict", post(routes::predict::predict))
        .route("/model-status", get(routes::status::model_status))
        .route("/api/v1/health", get(health_handler));
    if with_metrics {
        router = router.route("/metrics", get(routes::status::metrics));
    }

    router
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(RwLock::new(state)))
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model_loaded: state.engine.is_loaded(),
        predictions: state.counters.clone(),
    })
}

/// Initialize logging
pub fn init_logging(level: Level) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Run the server until the listener fails
pub async fn run_server(
    config: ServerConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind.clone();
    let mut state = AppState::new(config, metrics);
    match state.engine.refresh() {
        Ok(true) => info!("Serving predictions from {}", state.engine.model_path().display()),
        Ok(false) => info!(
            "No model at {}, serving rule-based predictions",
            state.engine.model_path().display()
        ),
        Err(e) => warn!("Model could not be loaded at startup: {}", e),
    }
    let app = create_router(state);

    info!("Starting income prediction server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
