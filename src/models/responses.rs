use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::domain::{MatchingResult, RankedPosting};

/// Flattened view of a ranked posting for the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub rank: usize,
    pub title: String,
    pub company: Option<String>,
    pub location: String,
    pub profession: Option<String>,
    pub total_score: f64,
    pub interest_score: f64,
    pub location_score: f64,
    pub skill_score: f64,
    pub preference_score: f64,
    pub explanation: String,
    pub source_url: String,
}

impl From<&RankedPosting> for MatchSummary {
    fn from(ranked: &RankedPosting) -> Self {
        Self {
            rank: ranked.rank,
            title: ranked.posting.title.clone(),
            company: ranked.posting.company_name.clone(),
            location: ranked.posting.location.clone(),
            profession: ranked.posting.profession.clone(),
            total_score: ranked.score.total_score,
            interest_score: ranked.score.interest_score,
            location_score: ranked.score.location_score,
            skill_score: ranked.score.skill_score,
            preference_score: ranked.score.preference_score,
            explanation: ranked.score.explanation.clone(),
            source_url: ranked.posting.source_url.clone(),
        }
    }
}

/// Response for the find-matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub total_found: usize,
    pub processing_time: f64,
    pub ai_summary: String,
    pub filters_applied: HashMap<String, String>,
    pub top_matches: Vec<MatchSummary>,
}

impl From<MatchingResult> for FindMatchesResponse {
    fn from(result: MatchingResult) -> Self {
        Self {
            total_found: result.total_found,
            processing_time: result.processing_time,
            ai_summary: result.ai_summary,
            filters_applied: result.filters_applied,
            top_matches: result.ranked_postings.iter().map(MatchSummary::from).collect(),
        }
    }
}

/// One suggested profession for a free-text interest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionSuggestion {
    pub interest: String,
    pub profession: String,
    pub similarity: f64,
    pub explanation: String,
}

/// Response for the profession suggestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestProfessionsResponse {
    pub suggestions: Vec<ProfessionSuggestion>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Catalog and cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_active_postings: i64,
    pub total_companies: i64,
    pub distance_cache_size: usize,
    pub embedding_cache_size: u64,
}
