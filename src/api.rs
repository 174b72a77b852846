//! Gemini generative-language API client.
//!
//! This module provides the two operations the summarizer needs from the
//! Gemini REST API:
//!
//! - [`GeminiClient::list_models`]: discover which models the key can use
//! - [`GeminiClient::generate`]: run a single prompt against one model
//!
//! Calls are made exactly once; there is no retry. Callers treat every
//! [`ApiError`] as a signal to fall back to local summarization.

use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Failure talking to the generative service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service error: {0}")]
    Service(String),
    #[error("response contained no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for ApiError {
    /// Drops the request URL, which carries the `key` query parameter.
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.without_url())
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Minimal Gemini REST client bound to one API key.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Names of every model available to this key, e.g. `models/gemini-pro`.
    #[instrument(level = "info", skip_all)]
    pub async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::Service(format!("invalid model listing: {e}")))?;
        let names: Vec<String> = parsed.models.into_iter().map(|m| m.name).collect();
        debug!(models = ?names, "Available Gemini models");
        Ok(names)
    }

    /// Send one prompt to `model` and return the concatenated response text.
    #[instrument(level = "info", skip(self, prompt))]
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, ApiError> {
        let t0 = Instant::now();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/{}:generateContent", self.base_url, model_path))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Gemini call failed"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::Service(format!("invalid generate response: {e}")))?;
        if let Some(error) = parsed.error {
            return Err(ApiError::Service(error.message));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Gemini call succeeded");
        let text = text.trim();
        if text.is_empty() {
            Err(ApiError::EmptyResponse)
        } else {
            Ok(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(&server.uri(), "gm_live_key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_serializes_correctly() {
        let req = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, json!({"contents": [{"parts": [{"text": "hello"}]}]}));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = GeminiClient::new("https://gemini.test", "secret-key", Duration::from_secs(1))
            .unwrap();
        assert!(!format!("{client:?}").contains("secret-key"));
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(query_param("key", "gm_live_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "models/gemini-pro", "displayName": "Gemini Pro"},
                    {"name": "models/embedding-001"}
                ]
            })))
            .mount(&server)
            .await;

        let models = client(&server).list_models().await.unwrap();
        assert_eq!(models, vec!["models/gemini-pro", "models/embedding-001"]);
    }

    #[tokio::test]
    async fn test_list_models_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client(&server).list_models().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_generate_joins_and_trims_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(body_partial_json(json!({"contents": [{"parts": [{"text": "prompt"}]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "  First part."}, {"text": " Second part.\n"}]}
                }]
            })))
            .mount(&server)
            .await;

        let text = client(&server).generate("gemini-pro", "prompt").await.unwrap();
        assert_eq!(text, "First part. Second part.");
    }

    #[tokio::test]
    async fn test_generate_accepts_qualified_model_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.0-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .mount(&server)
            .await;

        let text = client(&server)
            .generate("models/gemini-1.0-pro", "prompt")
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_generate_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client(&server).generate("gemini-pro", "prompt").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_generate_service_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": 400, "message": "quota exhausted"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate("gemini-pro", "prompt").await.unwrap_err();
        assert_eq!(err.to_string(), "service error: quota exhausted");
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let client =
            GeminiClient::new("http://127.0.0.1:1", "gm_live_key", Duration::from_secs(5)).unwrap();

        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!err.to_string().contains("gm_live_key"), "{err}");

        let err = client.generate("gemini-pro", "prompt").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!err.to_string().contains("gm_live_key"), "{err}");
    }
}
