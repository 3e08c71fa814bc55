use crate::{
    client::InferenceClient,
    codec,
    config::BackendConfig,
    error::AnalyzerError,
    messages::{AnalyzeResponse, EchoImage, ErrorResponse, ModelsResponse, StatusResponse},
    model::{fallback_models, vision_models},
    request::{AnalysisRequest, is_allowed_file, validate_prompt},
    staging::{MAX_UPLOAD_BYTES, StagingArea, UploadBudget, staged_name},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::{path::PathBuf, sync::Arc};

/// Room for the prompt, model and multipart framing on top of the images.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared, read-only settings for the web handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub backend: BackendConfig,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(backend: BackendConfig, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            upload_dir: upload_dir.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(get_status))
        .route("/api/analyze", post(post_analyze))
        .route("/api/models", get(get_models))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES))
        .with_state(Arc::new(state))
}

/// JSON error reply `{error, details}` with its status code.
#[derive(Debug)]
pub struct Rejection {
    status: StatusCode,
    body: ErrorResponse,
}

impl Rejection {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                details: None,
            },
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AnalyzerError> for Rejection {
    fn from(error: AnalyzerError) -> Self {
        match error {
            AnalyzerError::Validation(message) => Rejection::bad_request(message),
            AnalyzerError::PayloadTooLarge { .. } => {
                Rejection::new(StatusCode::PAYLOAD_TOO_LARGE, "Upload too large")
                    .with_details(error.to_string())
            }
            AnalyzerError::Connection { .. } => {
                log::error!("Connection error: {error}");
                Rejection::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Cannot connect to Ollama. Please ensure Ollama is running (ollama serve)",
                )
                .with_details(error.to_string())
            }
            error => {
                log::error!("Analysis failed: {error}");
                Rejection::new(StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed")
                    .with_details(error.to_string())
            }
        }
    }
}

impl From<MultipartError> for Rejection {
    fn from(error: MultipartError) -> Self {
        let status = error.status();
        log::warn!("Rejected upload: {}", error.body_text());
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "Upload too large"
        } else {
            "Invalid upload"
        };
        Rejection::new(status, message).with_details(error.body_text())
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match InferenceClient::connect(state.backend.clone()).await {
        Ok(client) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: client.state().as_str().to_string(),
                model: Some(client.config().model.clone()),
                base_url: Some(client.config().base_url.clone()),
                error: None,
            }),
        ),
        Err(e) => {
            let (status, label) = if e.is_connection() {
                (StatusCode::SERVICE_UNAVAILABLE, "disconnected")
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, "error")
            };
            (
                status,
                Json(StatusResponse {
                    status: label.to_string(),
                    model: None,
                    base_url: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn get_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let listed = match InferenceClient::new(state.backend.clone()) {
        Ok(client) => client.list_models().await,
        Err(e) => Err(e),
    };

    let models = match listed {
        Ok(names) => vision_models(names),
        Err(e) => {
            log::warn!("Could not list backend models, offering defaults: {e}");
            fallback_models()
        }
    };

    Json(ModelsResponse { models })
}

struct UploadedImage {
    file_name: String,
    data: Bytes,
}

#[derive(Default)]
struct UploadForm {
    images: Vec<UploadedImage>,
    prompt: String,
    model: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, Rejection> {
    let mut form = UploadForm::default();
    let mut budget = UploadBudget::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" | "images[]" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                budget.consume(data.len())?;
                form.images.push(UploadedImage { file_name, data });
            }
            "prompt" => form.prompt = field.text().await?,
            "model" => form.model = Some(field.text().await?),
            other => log::debug!("Ignoring form field {other:?}"),
        }
    }

    log::debug!(
        "Received {} image(s), {} bytes",
        form.images.len(),
        budget.used()
    );

    Ok(form)
}

async fn post_analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, Rejection> {
    let form = read_form(multipart).await?;

    if form.images.is_empty() {
        return Err(Rejection::bad_request("No images uploaded"));
    }
    if form.images[0].file_name.is_empty() {
        return Err(Rejection::bad_request("No images selected"));
    }
    let prompt = validate_prompt(&form.prompt)?;

    let model = form
        .model
        .filter(|model| !model.trim().is_empty())
        .unwrap_or_else(|| state.backend.model.clone());

    // removed with everything in it once the response is built
    let staging = StagingArea::create(&state.upload_dir)?;

    let mut staged = Vec::with_capacity(form.images.len());
    for (index, image) in form.images.iter().enumerate() {
        if !is_allowed_file(&image.file_name) {
            log::warn!("Skipping unsupported upload {:?}", image.file_name);
            continue;
        }
        let file_name = staged_name(index, &image.file_name);
        staged.push(staging.stage(&file_name, &image.data)?);
    }

    if staged.is_empty() {
        return Err(Rejection::bad_request("No valid images uploaded"));
    }

    let request = AnalysisRequest::from_paths(&model, &prompt, &staged)?;

    let client = InferenceClient::connect(state.backend.clone()).await?;
    let response = client.analyze(&request).await?;

    log::info!("Analyzed {} drawing(s)", request.image_count());

    let images = staged
        .iter()
        .zip(request.images())
        .map(|(path, payload)| {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string();
            EchoImage {
                data: codec::data_uri(&name, payload),
                name,
            }
        })
        .collect();

    Ok(Json(AnalyzeResponse {
        success: true,
        result: response.text,
        images,
        model: request.model().to_string(),
        prompt: request.prompt().to_string(),
    }))
}
