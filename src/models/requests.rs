use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::models::domain::UserProfile;

/// Request to find matching apprenticeship postings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesRequest {
    pub profile: UserProfile,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u16,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_true")]
    pub apply_distance_filter: bool,
    /// Equality filters on posting fields; null values are ignored
    #[serde(default)]
    pub filters: HashMap<String, Option<String>>,
}

fn default_limit() -> u16 {
    50
}

fn default_min_score() -> f64 {
    0.3
}

fn default_true() -> bool {
    true
}

/// Request to match free-text interest descriptions against profession labels
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuggestProfessionsRequest {
    #[validate(length(min = 1))]
    pub interests: Vec<String>,
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}
