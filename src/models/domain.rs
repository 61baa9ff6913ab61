use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Interest categories used by the questionnaire and the profession map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestCategory {
    Technical,
    Creative,
    Social,
    Business,
    Nature,
    Health,
    Sports,
    Languages,
}

/// Ordinal skill level for technical skills (1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// Numeric value on the 1-4 scale used by the skill score formula
    pub fn value(&self) -> f64 {
        match self {
            SkillLevel::Beginner => 1.0,
            SkillLevel::Intermediate => 2.0,
            SkillLevel::Advanced => 3.0,
            SkillLevel::Expert => 4.0,
        }
    }
}

/// Transport mode for commute estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[serde(alias = "driving")]
    Car,
    #[serde(alias = "transit")]
    Public,
    #[serde(alias = "bicycling")]
    Bike,
    #[serde(alias = "walking")]
    Walk,
}

impl TransportMode {
    /// Average travel speed in km/h, calibrated for Switzerland
    pub fn speed_kmh(&self) -> f64 {
        match self {
            TransportMode::Car => 60.0,
            TransportMode::Public => 40.0,
            TransportMode::Bike => 20.0,
            TransportMode::Walk => 5.0,
        }
    }

    /// Fixed overhead in minutes (waiting, transfers) added to every estimate
    pub fn base_overhead_min(&self) -> f64 {
        match self {
            TransportMode::Public => 10.0,
            _ => 5.0,
        }
    }

    /// Mode name in the routing provider's vocabulary
    pub fn routing_mode(&self) -> &'static str {
        match self {
            TransportMode::Car => "driving",
            TransportMode::Public => "transit",
            TransportMode::Bike => "bicycling",
            TransportMode::Walk => "walking",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Public => "public",
            TransportMode::Bike => "bike",
            TransportMode::Walk => "walk",
        }
    }
}

/// Company size preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanySize {
    Small,
    Medium,
    Large,
    Any,
}

/// Preferred work environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkEnvironment {
    Office,
    Field,
    Workshop,
    Mixed,
    Any,
}

/// Team requirement inferred from posting text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamRequirement {
    Team,
    Individual,
    Mixed,
}

/// Profile validation failures; these are hard errors, never silently defaulted
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("interest rating for {0:?} is {1}, must be 1-5")]
    InterestOutOfRange(InterestCategory, u8),

    #[error("soft skill rating '{0}' is {1}, must be 1-5")]
    SoftSkillOutOfRange(String, u8),

    #[error("team_vs_individual is {0}, must be 1-5")]
    TeamScaleOutOfRange(u8),

    #[error("{0} is {1}, must be 1-5")]
    ImportanceOutOfRange(&'static str, u8),
}

/// Complete user profile built from the questionnaire
///
/// Immutable for the duration of a matching run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub age: u8,
    pub location: String,
    pub postal_code: String,
    pub max_commute_minutes: u32,
    pub preferred_transport: TransportMode,
    /// Interest ratings on a 1-5 scale per category
    pub interests: HashMap<InterestCategory, u8>,
    /// Technical skill levels keyed by skill name (math_skills, computer_skills, ...)
    #[serde(default)]
    pub technical_skills: HashMap<String, SkillLevel>,
    /// Soft skill ratings on a 1-5 scale (communication, teamwork, ...)
    #[serde(default)]
    pub soft_skills: HashMap<String, u8>,
    pub company_size_preference: CompanySize,
    pub work_environment: WorkEnvironment,
    /// 1 = prefers individual work, 5 = prefers team work
    pub team_vs_individual: u8,
    #[serde(default)]
    pub career_goals: Vec<String>,
    pub salary_importance: u8,
    pub growth_importance: u8,
    /// Sector labels the user wants to avoid (gastronomy, retail, ...)
    #[serde(default)]
    pub avoid_sectors: Vec<String>,
    #[serde(default)]
    pub required_benefits: Vec<String>,
}

impl UserProfile {
    /// Check declared rating ranges. Out-of-range values propagate as errors
    /// rather than being clamped into a default profile.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for (category, rating) in &self.interests {
            if !(1..=5).contains(rating) {
                return Err(ProfileError::InterestOutOfRange(*category, *rating));
            }
        }
        for (skill, rating) in &self.soft_skills {
            if !(1..=5).contains(rating) {
                return Err(ProfileError::SoftSkillOutOfRange(skill.clone(), *rating));
            }
        }
        if !(1..=5).contains(&self.team_vs_individual) {
            return Err(ProfileError::TeamScaleOutOfRange(self.team_vs_individual));
        }
        if !(1..=5).contains(&self.salary_importance) {
            return Err(ProfileError::ImportanceOutOfRange(
                "salary_importance",
                self.salary_importance,
            ));
        }
        if !(1..=5).contains(&self.growth_importance) {
            return Err(ProfileError::ImportanceOutOfRange(
                "growth_importance",
                self.growth_importance,
            ));
        }
        Ok(())
    }
}

/// Apprenticeship posting from the catalog
///
/// Owned by the storage layer; treated as read-only during scoring.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub id: i64,
    pub title: String,
    pub profession: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    pub location: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    pub source_url: String,
    pub source_platform: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn default_true() -> bool {
    true
}

impl Posting {
    /// Profession label, falling back to the title when not set
    pub fn profession_or_title(&self) -> &str {
        match &self.profession {
            Some(p) if !p.is_empty() => p,
            _ => &self.title,
        }
    }
}

/// Scoring weights for the four sub-scores; must sum to 1.0
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub interest: f64,
    pub location: f64,
    pub skills: f64,
    pub preferences: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            interest: 0.35,
            location: 0.25,
            skills: 0.20,
            preferences: 0.20,
        }
    }
}

/// Complete match score with per-dimension breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub total_score: f64,
    pub interest_score: f64,
    pub location_score: f64,
    pub skill_score: f64,
    pub preference_score: f64,
    pub explanation: String,
}

impl MatchScore {
    /// Build a score, clamping every field to [0,1]
    pub fn new(
        total_score: f64,
        interest_score: f64,
        location_score: f64,
        skill_score: f64,
        preference_score: f64,
        explanation: String,
    ) -> Self {
        Self {
            total_score: total_score.clamp(0.0, 1.0),
            interest_score: interest_score.clamp(0.0, 1.0),
            location_score: location_score.clamp(0.0, 1.0),
            skill_score: skill_score.clamp(0.0, 1.0),
            preference_score: preference_score.clamp(0.0, 1.0),
            explanation,
        }
    }
}

/// Posting with its match score and 1-based rank
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPosting {
    pub posting: Posting,
    pub score: MatchScore,
    pub rank: usize,
}

/// Result of a distance estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResult {
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub transport_mode: TransportMode,
    pub route_found: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl DistanceResult {
    /// A failed estimation, as opposed to an estimated-but-usable fallback result
    pub fn is_failure(&self) -> bool {
        !self.route_found && self.error_message.is_some()
    }
}

/// Complete result of a matching run
#[derive(Debug, Clone)]
pub struct MatchingResult {
    pub ranked_postings: Vec<RankedPosting>,
    pub total_found: usize,
    pub processing_time: f64,
    pub ai_summary: String,
    pub filters_applied: HashMap<String, String>,
}

/// Narrated recommendation for a single posting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub match_reason: String,
    pub growth_potential: String,
    pub considerations: String,
    pub next_steps: Vec<String>,
    pub confidence: f64,
}
