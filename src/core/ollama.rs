//! Ollama Integration
//!
//! Talks to a local Ollama server: checks the configured model is present,
//! pulls it once when it is not, and runs non-streamed generations.

use super::InferenceBackend;
use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const TAGS_TIMEOUT: Duration = Duration::from_secs(5);
const PULL_TIMEOUT: Duration = Duration::from_secs(300);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

/// `/api/tags` response
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

/// Final object of a non-streamed `/api/pull`
#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Non-streamed `/api/generate` response
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Handles requests to the Ollama HTTP API
#[derive(Clone, Debug)]
pub struct OllamaClient {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create new Ollama client from config
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(&config.ollama_url, &config.ollama_model)
    }

    pub fn with_endpoint(url: &str, model: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Health check - verify Ollama is reachable
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Names of all models installed on the server
    pub async fn list_models(&self) -> ServiceResult<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::InferenceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::InferenceUnavailable(format!(
                "tags query returned {status}"
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InferenceUnavailable(format!("bad tags response: {e}")))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Download the configured model, blocking until the server reports completion
    pub async fn pull_model(&self) -> ServiceResult<()> {
        info!("⬇️ Pulling model '{}' (this may take a while)...", self.model);

        let response = self
            .client
            .post(format!("{}/api/pull", self.url))
            .json(&serde_json::json!({
                "model": self.model,
                "stream": false
            }))
            .timeout(PULL_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::ModelUnavailable(format!("{}: {}", self.model, e)))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| ServiceError::ModelUnavailable(format!("{}: {}", self.model, e)))?;

        if !status.is_success() {
            return Err(ServiceError::ModelUnavailable(format!(
                "{}: pull returned {} ({})",
                self.model,
                status,
                body_text.trim()
            )));
        }

        // An empty 200 body is accepted; otherwise the final status must be "success"
        if !body_text.trim().is_empty() {
            let pull: PullResponse = serde_json::from_str(&body_text).map_err(|e| {
                ServiceError::ModelUnavailable(format!("{}: bad pull response: {}", self.model, e))
            })?;
            if let Some(error) = pull.error {
                return Err(ServiceError::ModelUnavailable(format!(
                    "{}: {}",
                    self.model, error
                )));
            }
            if let Some(state) = pull.status.filter(|s| s != "success") {
                return Err(ServiceError::ModelUnavailable(format!(
                    "{}: pull ended with status '{}'",
                    self.model, state
                )));
            }
        }

        info!("✅ Model '{}' pulled successfully", self.model);
        Ok(())
    }

    /// Make sure the configured model is installed, pulling it once if it is not
    pub async fn ensure_model(&self) -> ServiceResult<()> {
        let available = self.list_models().await?;
        debug!("Available models: {:?}", available);

        if available.iter().any(|name| model_matches(&self.model, name)) {
            debug!("✓ Model '{}' is available", self.model);
            return Ok(());
        }

        warn!("⚠️ Model '{}' not found on {}", self.model, self.url);
        self.pull_model().await
    }

    /// Ask the server to load the model into memory ahead of the first trigger
    pub async fn warm_up(&self) -> ServiceResult<()> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": "",
                "stream": false
            }))
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::InferenceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::InferenceUnavailable(format!(
                "warm-up returned {status}"
            )));
        }
        info!("✅ Model '{}' is loaded and responding", self.model);
        Ok(())
    }

    async fn request_completion(&self, instructions: &str, input: &str) -> ServiceResult<String> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&serde_json::json!({
                "model": self.model,
                "system": instructions,
                "prompt": input,
                "stream": false
            }))
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::InferenceUnavailable(e.to_string()))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| ServiceError::InferenceUnavailable(e.to_string()))?;

        if !status.is_success() {
            warn!("❌ Ollama API Error ({}): {}", status, body_text);
            return Err(ServiceError::InferenceUnavailable(format!(
                "generate returned {status}"
            )));
        }

        debug!("🧠 Ollama raw body: {}", body_text);
        parse_completion(&body_text)
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn generate(&self, instructions: &str, input: &str) -> ServiceResult<String> {
        self.ensure_model().await?;

        info!("🤖 Sending text to {} for processing...", self.model);
        debug!("Input text length: {} characters", input.chars().count());

        let text = self.request_completion(instructions, input).await?;
        info!(
            "✅ Text processed successfully (length: {} characters)",
            text.chars().count()
        );
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Whether an installed model name satisfies the configured one.
///
/// An explicit tag must match exactly; a bare name matches any tag.
pub fn model_matches(configured: &str, available: &str) -> bool {
    if configured.contains(':') {
        configured == available
    } else {
        available.split(':').next() == Some(configured)
    }
}

fn parse_completion(body: &str) -> ServiceResult<String> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::InferenceEmptyResult(format!("malformed response: {e}")))?;

    let text = parsed
        .response
        .map(|r| r.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ServiceError::InferenceEmptyResult(
            "model returned an empty response".to_string(),
        ));
    }
    Ok(text)
}
