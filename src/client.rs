use crate::{
    config::BackendConfig,
    error::AnalyzerError,
    request::{AnalysisRequest, AnalysisResponse},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TAGS_PATH: &str = "/api/tags";
const GENERATE_PATH: &str = "/api/generate";

/// Returned when the backend answers without a `response` field.
pub const EMPTY_RESPONSE_FALLBACK: &str = "No response from model";

/// Whether the backend has answered a health check for this client.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConnectionState {
    Unchecked,
    HealthVerified,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Unchecked => "unchecked",
            ConnectionState::HealthVerified => "ready",
        }
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: &'a [String],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Body of `GET /api/tags`.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

/// Prompt sent when several drawings are analyzed in one call.
pub fn batch_prompt(prompt: &str, count: usize) -> String {
    format!("{prompt}\n\nNote: Analyzing {count} drawings together.")
}

/// Client for an Ollama-compatible generation backend.
///
/// Every instance is independent: front ends build one per request with
/// [`InferenceClient::connect`], which verifies the backend before returning.
/// Analysis calls never retry and never re-check health.
pub struct InferenceClient {
    http: reqwest::Client,
    config: BackendConfig,
    state: ConnectionState,
}

impl InferenceClient {
    /// Creates a client without contacting the backend.
    pub fn new(config: BackendConfig) -> Result<Self, AnalyzerError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.health_timeout)
            .build()
            .map_err(|e| AnalyzerError::Connection {
                base_url: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config,
            state: ConnectionState::Unchecked,
        })
    }

    /// Creates a client and runs the health check.
    pub async fn connect(config: BackendConfig) -> Result<Self, AnalyzerError> {
        let mut client = Self::new(config)?;
        client.check_health().await?;
        Ok(client)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Verifies the backend answers a model-list call within the health budget.
    pub async fn check_health(&mut self) -> Result<(), AnalyzerError> {
        log::debug!("Checking backend health at {}", self.config.base_url);

        self.tags().await.map_err(|e| {
            log::warn!("Health check against {} failed: {e}", self.config.base_url);
            AnalyzerError::Connection {
                base_url: self.config.base_url.clone(),
                reason: e.to_string(),
            }
        })?;

        self.state = ConnectionState::HealthVerified;
        Ok(())
    }

    /// Names of all models the backend has available.
    pub async fn list_models(&self) -> Result<Vec<String>, AnalyzerError> {
        let tags = self
            .tags()
            .await
            .map_err(|e| classify(e, self.config.health_timeout))?
            .json::<TagsResponse>()
            .await
            .map_err(|e| classify(e, self.config.health_timeout))?;
        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }

    pub async fn analyze_single(
        &self,
        image: &str,
        prompt: &str,
        model: &str,
    ) -> Result<String, AnalyzerError> {
        let images = [image.to_string()];
        self.generate(GenerateRequest {
            model,
            prompt,
            images: &images,
            stream: false,
        })
        .await
    }

    /// Sends every image in one request so the model sees them as one context.
    pub async fn analyze_batch(
        &self,
        images: &[String],
        prompt: &str,
        model: &str,
    ) -> Result<String, AnalyzerError> {
        let prompt = batch_prompt(prompt, images.len());
        self.generate(GenerateRequest {
            model,
            prompt: &prompt,
            images,
            stream: false,
        })
        .await
    }

    /// Picks the single or batch call based on the number of images.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, AnalyzerError> {
        let text = match request.images() {
            [image] => {
                self.analyze_single(image, request.prompt(), request.model())
                    .await?
            }
            images => {
                self.analyze_batch(images, request.prompt(), request.model())
                    .await?
            }
        };

        Ok(AnalysisResponse { text })
    }

    /// `GET /api/tags`; only the status is checked here, callers decode the body.
    async fn tags(&self) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .get(self.config.endpoint(TAGS_PATH))
            .timeout(self.config.health_timeout)
            .send()
            .await?
            .error_for_status()
    }

    async fn generate(&self, body: GenerateRequest<'_>) -> Result<String, AnalyzerError> {
        if self.state != ConnectionState::HealthVerified {
            return Err(AnalyzerError::Connection {
                base_url: self.config.base_url.clone(),
                reason: "health check has not been performed".to_string(),
            });
        }

        log::info!(
            "Sending {} image(s) to model {}",
            body.images.len(),
            body.model
        );

        let response = self
            .http
            .post(self.config.endpoint(GENERATE_PATH))
            .timeout(self.config.generate_timeout)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| classify(e, self.config.generate_timeout))?;

        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| classify(e, self.config.generate_timeout))?;

        log::debug!("Generation completed");

        Ok(body
            .response
            .unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_string()))
    }
}

/// Splits transport failures into timeouts and everything else.
fn classify(error: reqwest::Error, timeout: Duration) -> AnalyzerError {
    if error.is_timeout() {
        log::warn!("Backend timed out: {error}");
        AnalyzerError::Timeout {
            secs: timeout.as_secs(),
        }
    } else {
        log::error!("Backend call failed: {error}");
        AnalyzerError::Network(error)
    }
}
