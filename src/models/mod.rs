// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CompanySize, DistanceResult, InterestCategory, MatchScore, MatchingResult, Posting,
    ProfileError, RankedPosting, Recommendation, ScoringWeights, SkillLevel, TeamRequirement,
    TransportMode, UserProfile, WorkEnvironment,
};
pub use requests::{FindMatchesRequest, SuggestProfessionsRequest};
pub use responses::{
    ErrorResponse, FindMatchesResponse, HealthResponse, MatchSummary, ProfessionSuggestion,
    StatsResponse, SuggestProfessionsResponse,
};
