use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{professions, MatchQuery, MatchingError, MatchingOrchestrator, TextSimilarityMatcher};
use crate::models::{
    ErrorResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse, ProfessionSuggestion,
    StatsResponse, SuggestProfessionsRequest, SuggestProfessionsResponse,
};
use crate::services::SqlitePostingStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqlitePostingStore>,
    pub matcher: Arc<MatchingOrchestrator>,
    pub similarity: Arc<TextSimilarityMatcher>,
}

/// Configure all matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches))
        .route("/professions/suggest", web::post().to(suggest_professions))
        .route("/stats", web::get().to(stats));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "profile": { ... },
///   "limit": 20,
///   "minScore": 0.3,
///   "applyDistanceFilter": true,
///   "filters": { "location": "Zürich" }
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let query = MatchQuery {
        limit: req.limit as usize,
        min_score: req.min_score,
        apply_distance_filter: req.apply_distance_filter,
        filters: req.filters.clone(),
    };

    tracing::info!(
        "Finding matches for profile in {}, limit: {}",
        req.profile.postal_code,
        query.limit
    );

    match state.matcher.find_matches(&req.profile, &query).await {
        Ok(result) => HttpResponse::Ok().json(FindMatchesResponse::from(result)),
        Err(MatchingError::InvalidProfile(e)) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid profile".to_string(),
            message: e.to_string(),
            status_code: 400,
        }),
        Err(e) => {
            tracing::error!("Matching failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matching failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Suggest professions for free-text interests
///
/// POST /api/v1/professions/suggest
///
/// Request body:
/// ```json
/// {
///   "interests": ["Ich arbeite gerne mit Computern"],
///   "topK": 3
/// }
/// ```
async fn suggest_professions(
    state: web::Data<AppState>,
    req: web::Json<SuggestProfessionsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let professions: Vec<String> = professions::known_professions()
        .into_iter()
        .map(String::from)
        .collect();

    let mut suggestions = Vec::new();
    for interest in &req.interests {
        let matches = match state
            .similarity
            .find_best_matches(interest, &professions, req.top_k)
            .await
        {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!("Embedding failed for '{}': {}", interest, e);
                return HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Suggestion failed".to_string(),
                    message: e.to_string(),
                    status_code: 500,
                });
            }
        };

        for m in matches {
            suggestions.push(ProfessionSuggestion {
                interest: interest.clone(),
                profession: m.matched_text,
                similarity: m.similarity_score,
                explanation: m.explanation,
            });
        }
    }

    HttpResponse::Ok().json(SuggestProfessionsResponse { suggestions })
}

/// Catalog and cache statistics
///
/// GET /api/v1/stats
async fn stats(state: web::Data<AppState>) -> impl Responder {
    match state.matcher.statistics().await {
        Ok(stats) => HttpResponse::Ok().json(StatsResponse {
            total_active_postings: stats.total_active_postings,
            total_companies: stats.total_companies,
            distance_cache_size: stats.distance_cache_size,
            embedding_cache_size: stats.embedding_cache_size,
        }),
        Err(e) => {
            tracing::error!("Failed to load statistics: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load statistics".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
