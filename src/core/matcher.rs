use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::core::distance::DistanceEstimator;
use crate::core::professions;
use crate::core::scoring::{ScoringEngine, ScoringError};
use crate::models::{
    MatchScore, MatchingResult, Posting, ProfileError, Recommendation, UserProfile,
};
use crate::services::cache::EmbeddingCache;
use crate::services::narration::{NarrationProvider, TemplateNarrator};
use crate::services::storage::{PostingStore, StorageError};

/// Errors from a matching run
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("scoring error: {0}")]
    Scoring(#[from] ScoringError),
}

/// Catalog and cache statistics
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub total_active_postings: i64,
    pub total_companies: i64,
    pub distance_cache_size: usize,
    pub embedding_cache_size: u64,
}

/// Parameters for a matching run, already validated at the HTTP boundary
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub limit: usize,
    pub min_score: f64,
    pub apply_distance_filter: bool,
    pub filters: HashMap<String, Option<String>>,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            min_score: 0.3,
            apply_distance_filter: true,
            filters: HashMap::new(),
        }
    }
}

/// Orchestrates the full matching pipeline: fetch, filter, score, narrate
pub struct MatchingOrchestrator {
    store: Arc<dyn PostingStore>,
    scoring: ScoringEngine,
    distance: Arc<DistanceEstimator>,
    narrator: Arc<dyn NarrationProvider>,
    embedding_cache: Arc<EmbeddingCache>,
}

impl MatchingOrchestrator {
    pub fn new(
        store: Arc<dyn PostingStore>,
        scoring: ScoringEngine,
        distance: Arc<DistanceEstimator>,
        narrator: Arc<dyn NarrationProvider>,
        embedding_cache: Arc<EmbeddingCache>,
    ) -> Self {
        Self {
            store,
            scoring,
            distance,
            narrator,
            embedding_cache,
        }
    }

    /// Run the matching pipeline for one profile.
    ///
    /// An invalid profile is a hard error. Per-posting problems during
    /// scoring or narration degrade gracefully instead of failing the run.
    pub async fn find_matches(
        &self,
        profile: &UserProfile,
        query: &MatchQuery,
    ) -> Result<MatchingResult, MatchingError> {
        profile.validate()?;

        let start = Instant::now();
        let filters_applied: HashMap<String, String> = query
            .filters
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
            .collect();

        let mut postings = self.store.list_active(&query.filters).await?;

        if query.apply_distance_filter && profile.max_commute_minutes > 0 {
            postings = self.filter_by_commute(postings, profile).await;
        }

        // Hard exclusion; the scoring penalty only covers soft preferences
        if !profile.avoid_sectors.is_empty() {
            postings.retain(|p| !professions::is_in_avoided_sector(p, &profile.avoid_sectors));
        }

        if postings.is_empty() {
            return Ok(MatchingResult {
                ranked_postings: Vec::new(),
                total_found: 0,
                processing_time: 0.0,
                ai_summary: "Keine passenden Lehrstellen gefunden.".to_string(),
                filters_applied,
            });
        }

        let total_found = postings.len();

        let mut ranked = self.scoring.rank(profile, &postings, query.limit);
        ranked.retain(|r| r.score.total_score >= query.min_score);

        let ai_summary = match self.narrator.summarize(&ranked).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Narration failed, using template summary: {}", e);
                TemplateNarrator::summary_for(&ranked)
            }
        };

        let processing_time = start.elapsed().as_secs_f64();

        tracing::info!(
            "Matched {} of {} postings in {:.3}s",
            ranked.len(),
            total_found,
            processing_time
        );

        Ok(MatchingResult {
            ranked_postings: ranked,
            total_found,
            processing_time,
            ai_summary,
            filters_applied,
        })
    }

    /// Commute filter: postings without a postal code pass through, since
    /// there is nothing to estimate against
    async fn filter_by_commute(
        &self,
        postings: Vec<Posting>,
        profile: &UserProfile,
    ) -> Vec<Posting> {
        let mut kept = Vec::with_capacity(postings.len());

        for posting in postings {
            let Some(postal) = posting.postal_code.as_deref() else {
                kept.push(posting);
                continue;
            };

            let within = self
                .distance
                .is_within_commute(
                    &profile.postal_code,
                    postal,
                    profile.max_commute_minutes,
                    profile.preferred_transport,
                )
                .await;

            if within {
                kept.push(posting);
            }
        }

        kept
    }

    /// Score one posting and narrate the result
    pub async fn detailed_recommendation(
        &self,
        profile: &UserProfile,
        posting_id: i64,
    ) -> Result<(MatchScore, Recommendation), MatchingError> {
        profile.validate()?;

        let posting = self.store.get(posting_id).await?;
        let score = self.scoring.score(profile, &posting)?;

        let recommendation = match self.narrator.recommend(profile, &posting, &score).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Narration failed, using template recommendation: {}", e);
                TemplateNarrator::recommendation_for_score(score.total_score)
            }
        };

        Ok((score, recommendation))
    }

    pub async fn statistics(&self) -> Result<EngineStats, MatchingError> {
        Ok(EngineStats {
            total_active_postings: self.store.count_active().await?,
            total_companies: self.store.distinct_companies().await?,
            distance_cache_size: self.distance.cache_size(),
            embedding_cache_size: self.embedding_cache.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CompanySize, InterestCategory, SkillLevel, TransportMode, WorkEnvironment,
    };
    use crate::services::cache::DistanceCache;
    use crate::services::routing::NoopRoutingProvider;
    use async_trait::async_trait;

    struct FixedStore {
        postings: Vec<Posting>,
    }

    #[async_trait]
    impl PostingStore for FixedStore {
        async fn list_active(
            &self,
            _filters: &HashMap<String, Option<String>>,
        ) -> Result<Vec<Posting>, StorageError> {
            Ok(self.postings.clone())
        }

        async fn get(&self, id: i64) -> Result<Posting, StorageError> {
            self.postings
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("posting {}", id)))
        }

        async fn count_active(&self) -> Result<i64, StorageError> {
            Ok(self.postings.len() as i64)
        }

        async fn distinct_companies(&self) -> Result<i64, StorageError> {
            Ok(self.postings.len() as i64)
        }
    }

    fn orchestrator(postings: Vec<Posting>) -> MatchingOrchestrator {
        let estimator = DistanceEstimator::new(
            Arc::new(NoopRoutingProvider),
            Arc::new(DistanceCache::new()),
        );
        MatchingOrchestrator::new(
            Arc::new(FixedStore { postings }),
            ScoringEngine::with_default_weights(),
            Arc::new(estimator),
            Arc::new(TemplateNarrator),
            Arc::new(EmbeddingCache::new(100)),
        )
    }

    fn profile() -> UserProfile {
        UserProfile {
            age: 17,
            location: "Zürich".to_string(),
            postal_code: "8001".to_string(),
            max_commute_minutes: 60,
            preferred_transport: TransportMode::Public,
            interests: HashMap::from([
                (InterestCategory::Technical, 5),
                (InterestCategory::Social, 2),
            ]),
            technical_skills: HashMap::from([(
                "computer_skills".to_string(),
                SkillLevel::Expert,
            )]),
            soft_skills: HashMap::from([("communication".to_string(), 3)]),
            company_size_preference: CompanySize::Medium,
            work_environment: WorkEnvironment::Mixed,
            team_vs_individual: 4,
            career_goals: vec![],
            salary_importance: 3,
            growth_importance: 4,
            avoid_sectors: vec![],
            required_benefits: vec![],
        }
    }

    fn posting(id: i64, profession: &str, postal: Option<&str>, company: &str) -> Posting {
        Posting {
            id,
            title: profession.to_string(),
            profession: Some(profession.to_string()),
            description: Some("Spannende Lehrstelle".to_string()),
            requirements: None,
            location: "Zürich".to_string(),
            postal_code: postal.map(String::from),
            company_name: Some(company.to_string()),
            source_url: format!("https://example.ch/{}", id),
            source_platform: "yousty".to_string(),
            is_active: true,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_returns_empty_result() {
        let o = orchestrator(vec![]);
        let result = o.find_matches(&profile(), &MatchQuery::default()).await.unwrap();

        assert_eq!(result.total_found, 0);
        assert!(result.ranked_postings.is_empty());
        assert_eq!(result.processing_time, 0.0);
        assert_eq!(result.ai_summary, "Keine passenden Lehrstellen gefunden.");
    }

    #[tokio::test]
    async fn test_pipeline_ranks_and_summarizes() {
        let o = orchestrator(vec![
            posting(1, "Informatiker/in EFZ", Some("8050"), "Tech AG"),
            posting(2, "Koch/Köchin EFZ", Some("8004"), "Restaurant Adler"),
        ]);

        let result = o.find_matches(&profile(), &MatchQuery::default()).await.unwrap();

        assert_eq!(result.total_found, 2);
        assert!(!result.ranked_postings.is_empty());
        assert_eq!(result.ranked_postings[0].rank, 1);
        assert_eq!(
            result.ranked_postings[0].posting.profession.as_deref(),
            Some("Informatiker/in EFZ")
        );
        assert!(result.ai_summary.contains("passende Lehrstellen"));
    }

    #[tokio::test]
    async fn test_invalid_profile_is_hard_error() {
        let o = orchestrator(vec![posting(1, "Informatiker/in EFZ", Some("8001"), "Tech AG")]);
        let mut bad = profile();
        bad.team_vs_individual = 9;

        assert!(matches!(
            o.find_matches(&bad, &MatchQuery::default()).await,
            Err(MatchingError::InvalidProfile(_))
        ));
    }

    #[tokio::test]
    async fn test_commute_filter_drops_distant_postings() {
        let o = orchestrator(vec![
            posting(1, "Informatiker/in EFZ", Some("8002"), "Tech AG"),
            // Lugano, far beyond a 30 minute commute from Zürich
            posting(2, "Informatiker/in EFZ", Some("6900"), "Ticino SA"),
        ]);

        let mut p = profile();
        p.max_commute_minutes = 30;

        let result = o.find_matches(&p, &MatchQuery::default()).await.unwrap();
        assert_eq!(result.total_found, 1);
        assert_eq!(result.ranked_postings[0].posting.id, 1);
    }

    #[tokio::test]
    async fn test_postings_without_postal_code_pass_commute_filter() {
        let o = orchestrator(vec![posting(1, "Informatiker/in EFZ", None, "Tech AG")]);

        let mut p = profile();
        p.max_commute_minutes = 10;

        let result = o.find_matches(&p, &MatchQuery::default()).await.unwrap();
        assert_eq!(result.total_found, 1);
    }

    #[tokio::test]
    async fn test_distance_filter_can_be_disabled() {
        let o = orchestrator(vec![posting(1, "Informatiker/in EFZ", Some("6900"), "Ticino SA")]);

        let mut p = profile();
        p.max_commute_minutes = 10;
        let query = MatchQuery {
            apply_distance_filter: false,
            ..MatchQuery::default()
        };

        let result = o.find_matches(&p, &query).await.unwrap();
        assert_eq!(result.total_found, 1);
    }

    #[tokio::test]
    async fn test_avoided_sectors_are_hard_filtered() {
        let o = orchestrator(vec![
            posting(1, "Informatiker/in EFZ", Some("8001"), "Tech AG"),
            posting(2, "Koch/Köchin EFZ", Some("8001"), "Restaurant Adler"),
        ]);

        let mut p = profile();
        p.avoid_sectors.push("gastronomy".to_string());

        let result = o.find_matches(&p, &MatchQuery::default()).await.unwrap();
        assert_eq!(result.total_found, 1);
        assert!(result
            .ranked_postings
            .iter()
            .all(|r| r.posting.id == 1));
    }

    #[tokio::test]
    async fn test_min_score_cut_keeps_total_found() {
        let o = orchestrator(vec![
            posting(1, "Informatiker/in EFZ", Some("8001"), "Tech AG"),
            posting(2, "Landwirt/in EFZ", Some("8001"), "Hof Muster"),
        ]);

        let query = MatchQuery {
            min_score: 0.99,
            ..MatchQuery::default()
        };

        let result = o.find_matches(&profile(), &query).await.unwrap();
        // total_found counts survivors of filtering, not of the score cut
        assert_eq!(result.total_found, 2);
        assert!(result.ranked_postings.len() < 2);
    }

    #[tokio::test]
    async fn test_detailed_recommendation() {
        let o = orchestrator(vec![posting(1, "Informatiker/in EFZ", Some("8001"), "Tech AG")]);

        let (score, recommendation) = o.detailed_recommendation(&profile(), 1).await.unwrap();
        assert!(score.total_score > 0.0);
        assert_eq!(recommendation.confidence, score.total_score);
        assert_eq!(recommendation.next_steps.len(), 3);
    }

    #[tokio::test]
    async fn test_detailed_recommendation_unknown_posting() {
        let o = orchestrator(vec![]);
        assert!(matches!(
            o.detailed_recommendation(&profile(), 42).await,
            Err(MatchingError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_statistics() {
        let o = orchestrator(vec![posting(1, "Informatiker/in EFZ", Some("8001"), "Tech AG")]);
        let stats = o.statistics().await.unwrap();
        assert_eq!(stats.total_active_postings, 1);
        assert_eq!(stats.distance_cache_size, 0);
    }
}
