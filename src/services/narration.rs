use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{MatchScore, Posting, RankedPosting, Recommendation, UserProfile};

/// Errors from a narration provider call
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Narration API error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Capability interface for generating German recommendation texts.
///
/// The template implementation is always available; callers fall back to it
/// when an external backend fails.
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    /// Detailed recommendation for one ranked posting
    async fn recommend(
        &self,
        profile: &UserProfile,
        posting: &Posting,
        score: &MatchScore,
    ) -> Result<Recommendation, NarrationError>;

    /// Short motivating summary over the whole result list
    async fn summarize(&self, ranked: &[RankedPosting]) -> Result<String, NarrationError>;
}

/// Score-tiered German templates, no external dependency
#[derive(Debug, Default)]
pub struct TemplateNarrator;

const CONSIDERATIONS: &str =
    "Überlege dir, ob die Arbeitszeiten und das Arbeitsumfeld zu dir passen.";

fn next_steps() -> Vec<String> {
    vec![
        "Informiere dich über das Unternehmen".to_string(),
        "Besuche die Website".to_string(),
        "Erkundige dich nach Schnuppermöglichkeiten".to_string(),
    ]
}

impl TemplateNarrator {
    pub fn recommendation_for_score(total_score: f64) -> Recommendation {
        let (match_reason, growth_potential) = if total_score >= 0.8 {
            (
                "Diese Lehrstelle passt ausgezeichnet zu deinen Interessen, Fähigkeiten und Wünschen. Die hohe Übereinstimmung zeigt, dass du hier erfolgreich sein könntest.",
                "Dieser Berufsweg bietet dir hervorragende Entwicklungsmöglichkeiten und passt zu deinen langfristigen Zielen.",
            )
        } else if total_score >= 0.6 {
            (
                "Diese Lehrstelle bietet eine gute Passung zu deinem Profil. Mehrere wichtige Faktoren stimmen mit deinen Vorstellungen überein.",
                "In diesem Bereich kannst du deine Interessen weiterentwickeln und neue Fähigkeiten erlernen.",
            )
        } else if total_score >= 0.4 {
            (
                "Diese Lehrstelle könnte interessant für dich sein, auch wenn nicht alle Aspekte perfekt passen. Es ist eine Gelegenheit, Neues zu entdecken.",
                "Dieser Beruf könnte dir neue Perspektiven eröffnen und unentdeckte Talente fördern.",
            )
        } else {
            (
                "Diese Lehrstelle weicht von deinen ursprünglichen Vorstellungen ab, könnte aber dennoch eine wertvolle Erfahrung sein.",
                "Manchmal führen unerwartete Wege zu überraschenden Erfolgen und neuen Leidenschaften.",
            )
        };

        Recommendation {
            match_reason: match_reason.to_string(),
            growth_potential: growth_potential.to_string(),
            considerations: CONSIDERATIONS.to_string(),
            next_steps: next_steps(),
            confidence: total_score,
        }
    }

    pub fn summary_for(ranked: &[RankedPosting]) -> String {
        let Some(top) = ranked.first() else {
            return "Keine passenden Lehrstellen gefunden.".to_string();
        };

        format!(
            "Wir haben {} passende Lehrstellen für dich gefunden! Die beste Empfehlung ist '{}' bei {}. Diese Stelle passt zu {:.0}% zu deinem Profil. Schau dir die Details an und informiere dich über die Unternehmen!",
            ranked.len(),
            top.posting.title,
            top.posting.company_name.as_deref().unwrap_or("unbekannt"),
            top.score.total_score * 100.0,
        )
    }
}

#[async_trait]
impl NarrationProvider for TemplateNarrator {
    async fn recommend(
        &self,
        _profile: &UserProfile,
        _posting: &Posting,
        score: &MatchScore,
    ) -> Result<Recommendation, NarrationError> {
        Ok(Self::recommendation_for_score(score.total_score))
    }

    async fn summarize(&self, ranked: &[RankedPosting]) -> Result<String, NarrationError> {
        Ok(Self::summary_for(ranked))
    }
}

/// Chat-completions narration client
pub struct HttpNarrationClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

const SYSTEM_PROMPT: &str = "Du bist ein erfahrener Schweizer Berufsberater, der Jugendlichen bei der Lehrstellenwahl hilft. Antworte immer auf Deutsch.";

impl HttpNarrationClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, NarrationError> {
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

    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String, NarrationError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": max_tokens,
            "temperature": 0.7,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(NarrationError::ApiError(format!("{}: {}", status, text)));
        }

        let json: Value = response.json().await?;

        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                NarrationError::InvalidResponse("Missing choices[0].message.content".into())
            })
    }

    fn recommendation_prompt(
        profile: &UserProfile,
        posting: &Posting,
        score: &MatchScore,
    ) -> String {
        format!(
            "Als Berufsberater für Schweizer Jugendliche, analysiere diese Lehrstellen-Empfehlung:\n\n\
             PROFIL DES JUGENDLICHEN:\nAlter: {}\nWohnort: {}\nMaximale Pendelzeit: {} Minuten\n\n\
             LEHRSTELLE:\nTitel: {}\nFirma: {}\nOrt: {}\n\n\
             MATCH-SCORES:\nGesamt-Match: {:.1}%\n- Interessen-Match: {:.1}%\n- Standort-Score: {:.1}%\n- Fähigkeiten-Score: {:.1}%\n- Präferenzen-Score: {:.1}%\n\n\
             Erstelle eine persönliche Empfehlung. Antworte auf Deutsch, persönlich und motivierend.",
            profile.age,
            profile.location,
            profile.max_commute_minutes,
            posting.title,
            posting.company_name.as_deref().unwrap_or("unbekannt"),
            posting.location,
            score.total_score * 100.0,
            score.interest_score * 100.0,
            score.location_score * 100.0,
            score.skill_score * 100.0,
            score.preference_score * 100.0,
        )
    }
}

#[async_trait]
impl NarrationProvider for HttpNarrationClient {
    async fn recommend(
        &self,
        profile: &UserProfile,
        posting: &Posting,
        score: &MatchScore,
    ) -> Result<Recommendation, NarrationError> {
        let prompt = Self::recommendation_prompt(profile, posting, score);
        let content = self.complete(prompt, 500).await?;

        // The generated text replaces the templated reason; the structured
        // fields keep their template values
        let mut recommendation = TemplateNarrator::recommendation_for_score(score.total_score);
        recommendation.match_reason = content;
        Ok(recommendation)
    }

    async fn summarize(&self, ranked: &[RankedPosting]) -> Result<String, NarrationError> {
        if ranked.is_empty() {
            return Ok("Keine passenden Lehrstellen gefunden.".to_string());
        }

        let mut context = String::from("Hier sind die Top-Empfehlungen:\n\n");
        for r in ranked.iter().take(3) {
            context.push_str(&format!(
                "{}. {} bei {} in {} (Score: {:.1}%)\n",
                r.rank,
                r.posting.title,
                r.posting.company_name.as_deref().unwrap_or("unbekannt"),
                r.posting.location,
                r.score.total_score * 100.0,
            ));
        }

        let prompt = format!(
            "{}\n\nErstelle eine motivierende Zusammenfassung (max. 100 Wörter) für einen Jugendlichen, der nach Lehrstellen sucht. Erkläre kurz, warum diese Optionen empfohlen werden und ermutige zur weiteren Recherche. Antworte auf Deutsch.",
            context
        );

        self.complete(prompt, 200).await
    }
}
