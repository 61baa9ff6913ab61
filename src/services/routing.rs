use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::TransportMode;

/// Errors from a routing provider call
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Routing API error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Outcome of a successful routing call
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Found {
        distance_km: f64,
        duration_minutes: u32,
    },
    /// The service answered but found no route between the two points
    NoRoute,
}

/// Capability interface for external routing services.
///
/// Implementations are selected via configuration; a no-op implementation is
/// always available so the estimator can fall through to its heuristics.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(
        &self,
        origin_postal: &str,
        destination_postal: &str,
        mode: TransportMode,
    ) -> Result<RouteOutcome, RoutingError>;
}

/// Default provider: reports no route so callers use their centroid fallback
#[derive(Debug, Default)]
pub struct NoopRoutingProvider;

#[async_trait]
impl RoutingProvider for NoopRoutingProvider {
    async fn route(
        &self,
        _origin_postal: &str,
        _destination_postal: &str,
        _mode: TransportMode,
    ) -> Result<RouteOutcome, RoutingError> {
        Ok(RouteOutcome::NoRoute)
    }
}

/// Distance-matrix style HTTP routing client
pub struct HttpRoutingClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpRoutingClient {
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl RoutingProvider for HttpRoutingClient {
    async fn route(
        &self,
        origin_postal: &str,
        destination_postal: &str,
        mode: TransportMode,
    ) -> Result<RouteOutcome, RoutingError> {
        let mut params = vec![
            ("origins", format!("{}, Switzerland", origin_postal)),
            ("destinations", format!("{}, Switzerland", destination_postal)),
            ("mode", mode.routing_mode().to_string()),
            ("units", "metric".to_string()),
            ("key", self.api_key.clone()),
        ];

        if mode == TransportMode::Public {
            params.push(("transit_mode", "bus|train|tram".to_string()));
            params.push(("departure_time", "now".to_string()));
        }

        tracing::debug!(
            "Routing request: {} -> {} via {}",
            origin_postal,
            destination_postal,
            mode.as_str()
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let json: Value = response.json().await?;

        let status = json.get("status").and_then(|s| s.as_str()).unwrap_or("");
        if status != "OK" {
            let message = json
                .get("error_message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            return Err(RoutingError::ApiError(message.to_string()));
        }

        let element = json
            .get("rows")
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("elements"))
            .and_then(|e| e.get(0))
            .ok_or_else(|| RoutingError::InvalidResponse("Missing rows/elements".into()))?;

        let element_status = element.get("status").and_then(|s| s.as_str()).unwrap_or("");
        if element_status != "OK" {
            // The service is reachable but has no route between these points
            return Ok(RouteOutcome::NoRoute);
        }

        let distance_m = element
            .get("distance")
            .and_then(|d| d.get("value"))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| RoutingError::InvalidResponse("Missing distance value".into()))?;
        let duration_s = element
            .get("duration")
            .and_then(|d| d.get("value"))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| RoutingError::InvalidResponse("Missing duration value".into()))?;

        Ok(RouteOutcome::Found {
            distance_km: distance_m / 1000.0,
            duration_minutes: (duration_s / 60.0) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_provider_reports_no_route() {
        let provider = NoopRoutingProvider;
        let outcome = provider
            .route("8001", "3001", TransportMode::Public)
            .await
            .unwrap();
        assert_eq!(outcome, RouteOutcome::NoRoute);
    }

    #[tokio::test]
    async fn test_http_client_parses_found_route() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "status": "OK",
            "rows": [{
                "elements": [{
                    "status": "OK",
                    "distance": { "value": 12500 },
                    "duration": { "value": 1800 }
                }]
            }]
        });
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = HttpRoutingClient::new(server.url(), "key".to_string(), 10).unwrap();
        let outcome = client
            .route("8001", "3001", TransportMode::Car)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RouteOutcome::Found {
                distance_km: 12.5,
                duration_minutes: 30
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_client_no_route_falls_through() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "status": "OK",
            "rows": [{ "elements": [{ "status": "ZERO_RESULTS" }] }]
        });
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = HttpRoutingClient::new(server.url(), "key".to_string(), 10).unwrap();
        let outcome = client
            .route("8001", "9999", TransportMode::Public)
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::NoRoute);
    }

    #[tokio::test]
    async fn test_http_client_api_error_is_error() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "bad key"
        });
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = HttpRoutingClient::new(server.url(), "key".to_string(), 10).unwrap();
        let result = client.route("8001", "3001", TransportMode::Car).await;

        assert!(matches!(result, Err(RoutingError::ApiError(_))));
    }
}
