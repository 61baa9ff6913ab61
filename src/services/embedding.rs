use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use thiserror::Error;

/// Errors from an embedding provider call
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Embedding API error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Capability interface for text embedding backends.
///
/// A keyword-based implementation is always available so profession matching
/// works without any external service.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a German text into a dense vector
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError>;

    /// Identifier used in cache keys so vectors from different backends never mix
    fn model_name(&self) -> &str;
}

/// Keyword-count embedding over ten vocational categories
///
/// Each dimension counts German keyword hits for one category, normalized by
/// the category's vocabulary size. A small text-derived jitter breaks ties
/// deterministically, then the vector is L2-normalized.
#[derive(Debug, Default)]
pub struct KeywordEmbeddingProvider;

/// (category, keywords) in fixed dimension order
const CATEGORY_KEYWORDS: [(&str, &[&str]); 10] = [
    (
        "informatik",
        &["programmieren", "software", "computer", "digital", "it", "system", "daten", "code"],
    ),
    (
        "gesundheit",
        &["medizin", "pflege", "therapie", "patient", "krankenhaus", "spital", "behandlung"],
    ),
    (
        "verkauf",
        &["kunde", "beratung", "verkaufen", "service", "laden", "geschäft", "kasse"],
    ),
    (
        "handwerk",
        &["bauen", "reparieren", "werkzeug", "material", "montage", "installation"],
    ),
    (
        "gastronomie",
        &["kochen", "restaurant", "küche", "gäste", "service", "essen", "zubereitung"],
    ),
    (
        "verwaltung",
        &["büro", "organisation", "dokumente", "verwaltung", "buchführung", "administration"],
    ),
    (
        "kreativ",
        &["design", "gestaltung", "kunst", "kreativ", "farben", "formen", "ästhetik"],
    ),
    (
        "technik",
        &["maschinen", "mechanik", "elektrik", "engineering", "technisch", "wartung"],
    ),
    (
        "natur",
        &["umwelt", "natur", "garten", "landwirtschaft", "outdoor", "tiere", "pflanzen"],
    ),
    (
        "transport",
        &["fahren", "logistik", "transport", "lieferung", "verkehr", "güter"],
    ),
];

impl KeywordEmbeddingProvider {
    /// Small deterministic offset in [-0.01, 0.01] derived from (text, dimension)
    fn jitter(text: &str, dimension: usize) -> f64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        dimension.hash(&mut hasher);
        let h = hasher.finish();
        (h % 2001) as f64 / 1000.0 * 0.01 - 0.01
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        let lower = text.to_lowercase();

        let mut vector: Vec<f64> = CATEGORY_KEYWORDS
            .iter()
            .enumerate()
            .map(|(i, (_, keywords))| {
                let hits = keywords.iter().filter(|kw| lower.contains(*kw)).count();
                hits as f64 / keywords.len() as f64 + Self::jitter(&lower, i)
            })
            .collect();

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

/// HTTP embedding client for an OpenAI-compatible embeddings endpoint
pub struct HttpEmbeddingClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl HttpEmbeddingClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            model,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiError(format!("{}: {}", status, text)));
        }

        let json: Value = response.json().await?;

        let embedding = json
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| EmbeddingError::InvalidResponse("Missing data[0].embedding".into()))?;

        embedding
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| EmbeddingError::InvalidResponse("Non-numeric component".into()))
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_embedding_is_deterministic() {
        let provider = KeywordEmbeddingProvider;
        let a = provider.embed("Ich programmiere gerne Software").await.unwrap();
        let b = provider.embed("Ich programmiere gerne Software").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_keyword_embedding_is_unit_length() {
        let provider = KeywordEmbeddingProvider;
        let v = provider.embed("Kochen im Restaurant für Gäste").await.unwrap();
        let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert_eq!(v.len(), 10);
    }

    #[tokio::test]
    async fn test_keyword_embedding_peaks_on_matching_category() {
        let provider = KeywordEmbeddingProvider;
        let v = provider
            .embed("Software programmieren, Computer und digitale Systeme")
            .await
            .unwrap();

        let informatik = v[0];
        assert!(v.iter().all(|&x| x <= informatik));
    }

    #[tokio::test]
    async fn test_http_client_parses_embedding() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "data": [{ "embedding": [0.1, 0.2, 0.3] }]
        });
        server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = HttpEmbeddingClient::new(
            server.url(),
            "key".to_string(),
            "text-embedding-3-small".to_string(),
            10,
        )
        .unwrap();

        let v = client.embed("Informatik").await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_http_client_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embeddings")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let client = HttpEmbeddingClient::new(
            server.url(),
            "bad".to_string(),
            "text-embedding-3-small".to_string(),
            10,
        )
        .unwrap();

        assert!(matches!(
            client.embed("x").await,
            Err(EmbeddingError::ApiError(_))
        ));
    }
}
