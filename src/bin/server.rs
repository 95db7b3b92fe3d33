use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use placerank::{config, Classification, PlaceRankError, RankQuery, RankReport, RankingEngine};

#[derive(Clone)]
struct AppState {
    engine: Arc<RankingEngine>,
}

#[derive(Debug, Deserialize)]
struct RankRequest {
    place_id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default = "default_true")]
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct ClassifyRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    types: Vec<String>,
}

fn default_true() -> bool { true }

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    cache: CacheStatsDto,
}

#[derive(Debug, Serialize)]
struct CacheStatsDto {
    total_entries: u64,
    total_hits: u64,
    avg_hit_count: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "placerank_server=debug,placerank=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::load_config()?;

    tracing::info!("🚀 Starting PlaceRank Server");
    tracing::info!("📦 Database: {}", config.db_path);
    tracing::info!("🔌 Port: {}", config.port);

    let engine = RankingEngine::from_config(&config).await?;

    let state = AppState {
        engine: Arc::new(engine),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/rank", post(rank_handler))
        .route("/v1/classify", post(classify_handler))
        .route("/v1/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("📊 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: placerank::VERSION.to_string(),
    })
}

async fn rank_handler(
    State(state): State<AppState>,
    Json(req): Json<RankRequest>,
) -> Result<Json<RankReport>, AppError> {
    tracing::debug!("Rank request: {:?}", req);

    let query = RankQuery {
        place_id: req.place_id.clone(),
        text: req.text,
        use_cache: req.use_cache,
    };

    let report = state.engine.rank(query).await?;

    tracing::info!(
        "✅ {} → {} of {} ({:.1}ms)",
        req.place_id,
        report.position,
        report.total_ranked,
        report.latency_ms
    );

    Ok(Json(report))
}

async fn classify_handler(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Json<Classification> {
    Json(state.engine.classify(&req.text, req.types.as_slice()))
}

async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let cache_stats = state.engine.cache_stats().await?;

    Ok(Json(StatsResponse {
        cache: CacheStatsDto {
            total_entries: cache_stats.total_entries,
            total_hits: cache_stats.total_hits,
            avg_hit_count: cache_stats.avg_hit_count,
        },
    }))
}

// Error handling
struct AppError(PlaceRankError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            PlaceRankError::NotFound(place_id) => {
                (StatusCode::NOT_FOUND, format!("Place not found: {}", place_id))
            }
            PlaceRankError::Provider { provider, message } => {
                (StatusCode::BAD_GATEWAY, format!("Provider '{}' error: {}", provider, message))
            }
            e => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        tracing::error!("❌ Error: {} - {}", status, message);

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<PlaceRankError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
