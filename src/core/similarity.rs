use std::collections::HashMap;
use std::sync::Arc;

use crate::services::cache::EmbeddingCache;
use crate::services::embedding::{EmbeddingError, EmbeddingProvider, KeywordEmbeddingProvider};

/// A candidate text ranked against a query by embedding similarity
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    pub matched_text: String,
    pub similarity_score: f64,
    pub explanation: String,
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Free-text matcher over an embedding provider with a shared cache
///
/// Similarities are cosine values remapped from [-1,1] into [0,1] so callers
/// can treat them like the other sub-scores.
pub struct TextSimilarityMatcher {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<EmbeddingCache>,
}

impl TextSimilarityMatcher {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, cache: Arc<EmbeddingCache>) -> Self {
        Self { provider, cache }
    }

    /// Embed `text`, going through the cache. A provider failure degrades to
    /// the keyword model, cached under its own model key so the vector spaces
    /// never mix.
    async fn embedding(&self, text: &str) -> Result<Arc<Vec<f64>>, EmbeddingError> {
        let model = self.provider.model_name();

        if let Some(hit) = self.cache.get(text, model) {
            return Ok(hit);
        }

        let vector = match self.provider.embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!("Embedding failed for '{}', using keyword model: {}", text, e);
                let fallback = KeywordEmbeddingProvider;
                if let Some(hit) = self.cache.get(text, fallback.model_name()) {
                    return Ok(hit);
                }
                let vector = fallback.embed(text).await?;
                self.cache.put(text, fallback.model_name(), vector.clone());
                return Ok(Arc::new(vector));
            }
        };

        self.cache.put(text, model, vector.clone());
        Ok(Arc::new(vector))
    }

    /// Similarity between two texts in [0,1]
    pub async fn similarity(&self, text1: &str, text2: &str) -> Result<f64, EmbeddingError> {
        let a = self.embedding(text1).await?;
        let b = self.embedding(text2).await?;

        let cosine = cosine_similarity(&a, &b);
        Ok(((cosine + 1.0) / 2.0).clamp(0.0, 1.0))
    }

    /// Rank `candidates` against `query_text`, best first, at most `top_k`
    pub async fn find_best_matches(
        &self,
        query_text: &str,
        candidates: &[String],
        top_k: usize,
    ) -> Result<Vec<SimilarityMatch>, EmbeddingError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedding(query_text).await?;
        let mut matches = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let embedding = self.embedding(candidate).await?;
            let score = ((cosine_similarity(&query, &embedding) + 1.0) / 2.0).clamp(0.0, 1.0);

            matches.push(SimilarityMatch {
                matched_text: candidate.clone(),
                similarity_score: score,
                explanation: explain_match(query_text, score),
            });
        }

        matches.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);

        Ok(matches)
    }

    /// Best-matching profession for each free-text interest
    pub async fn match_interests_to_professions(
        &self,
        interests: &[String],
        professions: &[String],
    ) -> Result<HashMap<String, SimilarityMatch>, EmbeddingError> {
        let mut results = HashMap::new();

        for interest in interests {
            let matches = self.find_best_matches(interest, professions, 3).await?;
            if let Some(best) = matches.into_iter().next() {
                results.insert(interest.clone(), best);
            }
        }

        Ok(results)
    }
}

fn explain_match(query: &str, similarity: f64) -> String {
    if similarity > 0.8 {
        format!("Sehr ähnlich zu '{}' - hohe Übereinstimmung", query)
    } else if similarity > 0.6 {
        format!("Gut passend zu '{}' - gute Übereinstimmung", query)
    } else if similarity > 0.4 {
        format!("Teilweise passend zu '{}' - moderate Übereinstimmung", query)
    } else {
        format!("Wenig passend zu '{}' - geringe Übereinstimmung", query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedding::KeywordEmbeddingProvider;

    fn matcher() -> TextSimilarityMatcher {
        TextSimilarityMatcher::new(
            Arc::new(KeywordEmbeddingProvider),
            Arc::new(EmbeddingCache::new(1000)),
        )
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = [0.5, 0.5, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_identical_texts_are_maximally_similar() {
        let m = matcher();
        let s = m
            .similarity("Software programmieren", "Software programmieren")
            .await
            .unwrap();
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_related_text_beats_unrelated() {
        let m = matcher();
        let related = m
            .similarity("Ich programmiere gerne Software", "Computer und digitale Systeme")
            .await
            .unwrap();
        let unrelated = m
            .similarity("Ich programmiere gerne Software", "Kochen in der Küche für Gäste")
            .await
            .unwrap();
        assert!(related > unrelated);
    }

    #[tokio::test]
    async fn test_find_best_matches_orders_and_truncates() {
        let m = matcher();
        let candidates = vec![
            "Kochen im Restaurant".to_string(),
            "Software und Computer".to_string(),
            "Garten und Pflanzen".to_string(),
        ];

        let matches = m
            .find_best_matches("Ich mag programmieren und Software", &candidates, 2)
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].matched_text, "Software und Computer");
        assert!(matches[0].similarity_score >= matches[1].similarity_score);
    }

    #[tokio::test]
    async fn test_find_best_matches_empty_candidates() {
        let m = matcher();
        let matches = m.find_best_matches("irgendwas", &[], 5).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_match_interests_picks_best_profession() {
        let m = matcher();
        let interests = vec!["Computer und Software".to_string()];
        let professions = vec![
            "Koch/Köchin EFZ kochen Küche".to_string(),
            "Informatiker/in EFZ Software Computer".to_string(),
        ];

        let results = m
            .match_interests_to_professions(&interests, &professions)
            .await
            .unwrap();

        let best = results.get("Computer und Software").unwrap();
        assert_eq!(best.matched_text, "Informatiker/in EFZ Software Computer");
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_keyword_model() {
        struct FailingProvider;

        #[async_trait::async_trait]
        impl crate::services::embedding::EmbeddingProvider for FailingProvider {
            async fn embed(&self, _text: &str) -> Result<Vec<f64>, EmbeddingError> {
                Err(EmbeddingError::ApiError("down".to_string()))
            }

            fn model_name(&self) -> &str {
                "broken"
            }
        }

        let m = TextSimilarityMatcher::new(
            Arc::new(FailingProvider),
            Arc::new(EmbeddingCache::new(100)),
        );

        let s = m
            .similarity("Software programmieren", "Software programmieren")
            .await
            .unwrap();
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_persistent_cache_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.json");

        let m = TextSimilarityMatcher::new(
            Arc::new(KeywordEmbeddingProvider),
            Arc::new(EmbeddingCache::with_persistence(100, &path)),
        );
        m.similarity("Informatik", "Gastronomie").await.unwrap();
        assert!(path.exists());

        let reopened = EmbeddingCache::with_persistence(100, &path);
        assert_eq!(reopened.len(), 2);
        assert!(reopened
            .get("Informatik", KeywordEmbeddingProvider.model_name())
            .is_some());
    }

    #[tokio::test]
    async fn test_embeddings_are_cached() {
        let cache = Arc::new(EmbeddingCache::new(100));
        let m = TextSimilarityMatcher::new(Arc::new(KeywordEmbeddingProvider), cache.clone());

        m.similarity("Informatik", "Gastronomie").await.unwrap();
        assert_eq!(cache.len(), 2);

        m.similarity("Informatik", "Gastronomie").await.unwrap();
        assert_eq!(cache.len(), 2);
    }
}
