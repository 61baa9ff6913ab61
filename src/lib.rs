//! Lehrmatch - Apprenticeship matching service for Swiss school leavers
//!
//! This library implements the matching pipeline behind the HTTP service:
//! weighted multi-factor scoring of scraped apprenticeship postings against
//! a questionnaire profile, commute-time filtering with tiered distance
//! estimation, and embedding-based profession suggestions.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    DistanceEstimator, MatchQuery, MatchingOrchestrator, ScoringEngine, TextSimilarityMatcher,
};
pub use models::{
    FindMatchesRequest, FindMatchesResponse, MatchScore, MatchingResult, Posting, RankedPosting,
    ScoringWeights, UserProfile,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let weights = ScoringWeights::default();
        let total = weights.interest + weights.location + weights.skills + weights.preferences;
        assert!((total - 1.0).abs() < 1e-9);
    }
}
