use thiserror::Error;

use crate::core::professions;
use crate::models::{
    CompanySize, MatchScore, Posting, RankedPosting, ScoringWeights, TeamRequirement, UserProfile,
    WorkEnvironment,
};

/// Scoring failures for a single posting. These never abort a batch: the
/// ranking loop drops the affected posting and continues.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("posting {0} has neither profession nor title")]
    MissingProfession(i64),
}

/// Weighted multi-factor scoring engine
///
/// Scoring formula (weights configurable, defaults shown):
/// total = interest * 0.35 + location * 0.25 + skills * 0.20 + preferences * 0.20
///
/// Pure given its inputs: no I/O, deterministic.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    /// Calculate the complete match score for one posting
    pub fn score(
        &self,
        profile: &UserProfile,
        posting: &Posting,
    ) -> Result<MatchScore, ScoringError> {
        if posting.title.is_empty() && posting.profession.is_none() {
            return Err(ScoringError::MissingProfession(posting.id));
        }

        let interest_score = self.interest_score(profile, posting);
        let location_score = self.location_score(profile, posting);
        let skill_score = self.skill_score(profile, posting);
        let preference_score = self.preference_score(profile, posting);

        let total_score = self.weights.interest * interest_score
            + self.weights.location * location_score
            + self.weights.skills * skill_score
            + self.weights.preferences * preference_score;

        let explanation = self.explain(
            posting,
            interest_score,
            location_score,
            skill_score,
            preference_score,
        );

        Ok(MatchScore::new(
            total_score,
            interest_score,
            location_score,
            skill_score,
            preference_score,
            explanation,
        ))
    }

    /// Interest sub-score from the profession map, with a boost for strong
    /// matches and a penalty for avoided sectors
    fn interest_score(&self, profile: &UserProfile, posting: &Posting) -> f64 {
        let profession = posting.profession_or_title();

        let mut score = professions::interest_match(&profile.interests, profession);

        // Reward strong matches disproportionately
        if score > 0.8 {
            score = (score * 1.1).min(1.0);
        }

        // Soft penalty only; the hard exclusion lives in the orchestrator
        if professions::is_in_avoided_sector(posting, &profile.avoid_sectors) {
            score *= 0.3;
        }

        score
    }

    /// Location sub-score from the 4-digit postal code difference.
    ///
    /// A coarse proxy for Swiss geography, not a routing result.
    fn location_score(&self, profile: &UserProfile, posting: &Posting) -> f64 {
        let Some(posting_postal) = posting.postal_code.as_deref() else {
            return 0.7;
        };
        if posting_postal.is_empty() || profile.postal_code.is_empty() {
            return 0.7;
        }

        let (Ok(user_code), Ok(posting_code)) = (
            profile.postal_code.parse::<i32>(),
            posting_postal.parse::<i32>(),
        ) else {
            return 0.7;
        };

        match (user_code - posting_code).abs() {
            0 => 1.0,
            d if d < 100 => 0.9,
            d if d < 500 => 0.8,
            d if d < 1000 => 0.6,
            d if d < 2000 => 0.4,
            _ => 0.2,
        }
    }

    /// Skill sub-score: base 0.7 adjusted by keyword-group matches against
    /// the posting text
    fn skill_score(&self, profile: &UserProfile, posting: &Posting) -> f64 {
        let text = format!(
            "{} {} {}",
            posting.profession_or_title().to_lowercase(),
            posting.description.as_deref().unwrap_or("").to_lowercase(),
            posting.requirements.as_deref().unwrap_or("").to_lowercase(),
        );

        let mut score = 0.7;

        let it_terms = ["informatik", "computer", "digital", "software"];
        if it_terms.iter().any(|w| text.contains(w)) {
            if let Some(level) = profile.technical_skills.get("computer_skills") {
                score += (level.value() - 2.0) * 0.1;
            }
        }

        let math_terms = ["mathematik", "rechnen", "kalkulation", "technik"];
        if math_terms.iter().any(|w| text.contains(w)) {
            if let Some(level) = profile.technical_skills.get("math_skills") {
                score += (level.value() - 2.0) * 0.1;
            }
        }

        let customer_terms = ["kund", "beratung", "verkauf", "service", "kommunikation"];
        if customer_terms.iter().any(|w| text.contains(w)) {
            let communication = profile
                .soft_skills
                .get("communication")
                .copied()
                .unwrap_or(3) as f64;
            score += (communication - 3.0) * 0.05;
        }

        let manual_terms = ["handwerk", "montage", "bau", "reparatur", "werkstatt"];
        if manual_terms.iter().any(|w| text.contains(w)) {
            if let Some(level) = profile.technical_skills.get("manual_skills") {
                score += (level.value() - 2.0) * 0.1;
            }
        }

        score.clamp(0.0, 1.0)
    }

    /// Preference sub-score: company size, work environment and team fit
    fn preference_score(&self, profile: &UserProfile, posting: &Posting) -> f64 {
        let mut score: f64 = 0.5;

        let estimated_size =
            professions::estimate_company_size(posting.company_name.as_deref().unwrap_or(""));
        if profile.company_size_preference == CompanySize::Any
            || estimated_size == profile.company_size_preference
        {
            score += 0.2;
        } else if professions::sizes_compatible(profile.company_size_preference, estimated_size) {
            score += 0.1;
        }

        let work_env = professions::estimate_work_environment(
            posting.profession.as_deref().unwrap_or(""),
            posting.description.as_deref().unwrap_or(""),
        );
        if profile.work_environment == WorkEnvironment::Any
            || work_env == profile.work_environment
        {
            score += 0.2;
        } else if work_env == WorkEnvironment::Mixed {
            // Mixed environments are compatible with most preferences
            score += 0.1;
        }

        let team_requirement = professions::estimate_team_requirement(
            posting.profession.as_deref().unwrap_or(""),
            posting.description.as_deref().unwrap_or(""),
        );
        match team_requirement {
            TeamRequirement::Team if profile.team_vs_individual >= 4 => score += 0.1,
            TeamRequirement::Individual if profile.team_vs_individual <= 2 => score += 0.1,
            TeamRequirement::Mixed => score += 0.05,
            _ => {}
        }

        score.clamp(0.0, 1.0)
    }

    /// Assemble the human-readable explanation from score-tier phrases
    fn explain(
        &self,
        posting: &Posting,
        interest_score: f64,
        location_score: f64,
        skill_score: f64,
        preference_score: f64,
    ) -> String {
        let mut phrases: Vec<String> = Vec::new();

        if interest_score >= 0.8 {
            phrases.push("passt sehr gut zu deinen Interessen".to_string());
        } else if interest_score >= 0.6 {
            phrases.push("passt gut zu deinen Interessen".to_string());
        } else if interest_score < 0.4 {
            phrases.push("passt weniger zu deinen Hauptinteressen".to_string());
        }

        if location_score >= 0.8 {
            phrases.push("ist in deiner Nähe".to_string());
        } else if location_score >= 0.6 {
            phrases.push("ist gut erreichbar".to_string());
        } else if location_score < 0.4 {
            phrases.push("ist weiter entfernt".to_string());
        }

        if skill_score >= 0.8 {
            phrases.push("entspricht deinen Fähigkeiten".to_string());
        } else if skill_score < 0.5 {
            phrases.push("könnte deine Fähigkeiten herausfordern".to_string());
        }

        let company = posting
            .company_name
            .as_deref()
            .unwrap_or("diesem Unternehmen");
        if preference_score >= 0.7 {
            phrases.push(format!("bei {} passt zu deinen Vorstellungen", company));
        }

        if phrases.is_empty() {
            return format!(
                "Diese Lehrstelle bei {} könnte interessant für dich sein.",
                company
            );
        }

        format!("Diese Lehrstelle {}.", phrases.join(", "))
    }

    /// Score every posting and return them ranked by total score.
    ///
    /// Postings whose scoring fails are dropped with a warning; the batch
    /// continues. The sort is stable, so tied scores keep input order.
    pub fn rank(
        &self,
        profile: &UserProfile,
        postings: &[Posting],
        limit: usize,
    ) -> Vec<RankedPosting> {
        let mut scored: Vec<(Posting, MatchScore)> = Vec::with_capacity(postings.len());

        for posting in postings {
            match self.score(profile, posting) {
                Ok(score) => scored.push((posting.clone(), score)),
                Err(e) => {
                    tracing::warn!("Skipping posting {} during ranking: {}", posting.id, e);
                }
            }
        }

        scored.sort_by(|a, b| {
            b.1.total_score
                .partial_cmp(&a.1.total_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (posting, score))| RankedPosting {
                posting,
                score,
                rank: i + 1,
            })
            .collect()
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
