// Core algorithm exports
pub mod distance;
pub mod matcher;
pub mod professions;
pub mod scoring;
pub mod similarity;

pub use distance::{haversine_distance, postal_coordinates, DistanceEstimator};
pub use matcher::{EngineStats, MatchQuery, MatchingError, MatchingOrchestrator};
pub use professions::{interest_match, known_professions, profession_interest_map};
pub use scoring::{ScoringEngine, ScoringError};
pub use similarity::{cosine_similarity, SimilarityMatch, TextSimilarityMatcher};
