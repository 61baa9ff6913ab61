mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use crate::config::Settings;
use crate::core::{DistanceEstimator, MatchingOrchestrator, ScoringEngine, TextSimilarityMatcher};
use crate::models::ScoringWeights;
use crate::routes::matches::AppState;
use crate::services::{
    DistanceCache, EmbeddingCache, EmbeddingProvider, HttpEmbeddingClient, HttpNarrationClient,
    HttpRoutingClient, KeywordEmbeddingProvider, NarrationProvider, NoopRoutingProvider,
    RoutingProvider, SqlitePostingStore, TemplateNarrator,
};
use std::sync::Arc;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST),
        )
        .content_type("application/json")
        .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn build_routing_provider(settings: &crate::config::RoutingProviderSettings) -> Arc<dyn RoutingProvider> {
    if settings.mode == "http" {
        if let (Some(base_url), Some(api_key)) = (&settings.base_url, &settings.api_key) {
            match HttpRoutingClient::new(base_url.clone(), api_key.clone(), settings.timeout_secs) {
                Ok(client) => {
                    info!("Routing provider: http ({})", base_url);
                    return Arc::new(client);
                }
                Err(e) => error!("Failed to build routing client, using fallback: {}", e),
            }
        } else {
            error!("Routing mode is http but base_url/api_key are missing, using fallback");
        }
    }
    info!("Routing provider: heuristic fallback");
    Arc::new(NoopRoutingProvider)
}

fn build_embedding_provider(
    settings: &crate::config::EmbeddingProviderSettings,
) -> Arc<dyn EmbeddingProvider> {
    if settings.mode == "http" {
        if let (Some(base_url), Some(api_key)) = (&settings.base_url, &settings.api_key) {
            match HttpEmbeddingClient::new(
                base_url.clone(),
                api_key.clone(),
                settings.model.clone(),
                settings.timeout_secs,
            ) {
                Ok(client) => {
                    info!("Embedding provider: http ({})", settings.model);
                    return Arc::new(client);
                }
                Err(e) => error!("Failed to build embedding client, using keyword model: {}", e),
            }
        } else {
            error!("Embedding mode is http but base_url/api_key are missing, using keyword model");
        }
    }
    info!("Embedding provider: keyword model");
    Arc::new(KeywordEmbeddingProvider)
}

fn build_narration_provider(
    settings: &crate::config::NarrationProviderSettings,
) -> Arc<dyn NarrationProvider> {
    if settings.mode == "http" {
        if let (Some(base_url), Some(api_key)) = (&settings.base_url, &settings.api_key) {
            match HttpNarrationClient::new(
                base_url.clone(),
                api_key.clone(),
                settings.model.clone(),
                settings.timeout_secs,
            ) {
                Ok(client) => {
                    info!("Narration provider: http ({})", settings.model);
                    return Arc::new(client);
                }
                Err(e) => error!("Failed to build narration client, using templates: {}", e),
            }
        } else {
            error!("Narration mode is http but base_url/api_key are missing, using templates");
        }
    }
    info!("Narration provider: templates");
    Arc::new(TemplateNarrator)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the subscriber picks up the
    // configured level and format
    let settings = Settings::load().unwrap_or_else(|e| {
        panic!("Configuration error: {}", e);
    });

    // Initialize logging; RUST_LOG overrides the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Lehrmatch matching service...");
    info!("Configuration loaded successfully");

    // Open the posting catalog
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let store = Arc::new(
        SqlitePostingStore::new(&settings.database.url, db_max_conn)
            .await
            .unwrap_or_else(|e| {
                error!("Failed to open posting catalog: {}", e);
                panic!("Database error: {}", e);
            }),
    );

    info!("Posting catalog opened (max: {} connections)", db_max_conn);

    // Shared caches
    let distance_cache = Arc::new(DistanceCache::new());
    let embedding_cache = Arc::new(match &settings.cache.embedding_path {
        Some(path) => EmbeddingCache::with_persistence(settings.cache.embedding_capacity, path),
        None => EmbeddingCache::new(settings.cache.embedding_capacity),
    });

    // Capability providers selected via configuration
    let routing = build_routing_provider(&settings.providers.routing);
    let embedding = build_embedding_provider(&settings.providers.embedding);
    let narrator = build_narration_provider(&settings.providers.narration);

    let estimator = Arc::new(DistanceEstimator::new(routing, distance_cache));
    let similarity = Arc::new(TextSimilarityMatcher::new(embedding, embedding_cache.clone()));

    // Scoring engine with configured weights
    let weights = ScoringWeights {
        interest: settings.scoring.weights.interest,
        location: settings.scoring.weights.location,
        skills: settings.scoring.weights.skills,
        preferences: settings.scoring.weights.preferences,
    };
    let scoring = ScoringEngine::new(weights);

    info!("Scoring engine initialized with weights: {:?}", weights);

    let matcher = Arc::new(MatchingOrchestrator::new(
        store.clone(),
        scoring,
        estimator,
        narrator,
        embedding_cache,
    ));

    // Build application state
    let app_state = AppState {
        store,
        matcher,
        similarity,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
