pub mod config;
pub mod error;
pub mod metrics;
pub mod validation;

use std::{sync::Arc, time::Instant};

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};
use trtc_client::{ClientConfig, ClientError, Credentials, TrtcClient};
use tts_core::{
    AudioContainer, Language, SampleRate, SynthesisRequest, DEFAULT_SPEED, DEFAULT_VOICE_ID,
    DEFAULT_VOLUME, MAX_TEXT_LENGTH, MODEL, SPEED_RANGE, VOLUME_RANGE,
};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::metrics::{AppMetrics, MetricsResponse, Outcome};
use crate::validation::{validate_synthesis_form, SynthesisForm};

/// Something that turns a validated request into audio.
///
/// Implementations block; handlers call them from the blocking pool.
pub trait SpeechBackend: Send + Sync {
    fn synthesize(
        &self,
        credentials: Credentials,
        request: &SynthesisRequest,
    ) -> Result<AudioContainer, ClientError>;
}

/// Backend calling the remote API with the caller's own credentials
pub struct TrtcBackend {
    config: ClientConfig,
}

impl TrtcBackend {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl SpeechBackend for TrtcBackend {
    fn synthesize(
        &self,
        credentials: Credentials,
        request: &SynthesisRequest,
    ) -> Result<AudioContainer, ClientError> {
        TrtcClient::new(credentials, self.config.clone())?.synthesize(request)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn SpeechBackend>,
    pub metrics: Arc<AppMetrics>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(backend: Arc<dyn SpeechBackend>, config: ServerConfig) -> Self {
        Self {
            backend,
            metrics: Arc::new(AppMetrics::new()),
            config,
        }
    }
}

#[derive(Serialize)]
pub struct TtsResponse {
    audio_base64: String,
    duration_ms: u64,
    sample_rate: u32,
}

#[derive(Serialize)]
pub struct RangeInfo {
    min: f32,
    max: f32,
    default: f32,
    step: f32,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    model: &'static str,
    max_text_length: usize,
    languages: Vec<&'static str>,
    default_language: &'static str,
    sample_rates: Vec<u32>,
    default_sample_rate: u32,
    default_voice_id: &'static str,
    speed: RangeInfo,
    volume: RangeInfo,
}

/// Routes of the service, mounted at the root and under `/api`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/options", get(options))
        .route("/tts", post(tts_endpoint))
        .route("/tts/wav", post(tts_wav_endpoint))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(api.clone()) // root paths
        .nest("/api", api) // /api prefix
        .layer(axum::middleware::from_fn(add_request_id))
        .with_state(state)
}

// Request ID middleware for tracing
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let Ok(value) = HeaderValue::from_str(&request_id) else {
        return next.run(request).await;
    };
    request.headers_mut().insert("x-request-id", value.clone());
    let mut response = next.run(request).await;
    response.headers_mut().insert("x-request-id", value);
    response
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        model: MODEL,
        max_text_length: MAX_TEXT_LENGTH,
        languages: Language::ALL.iter().map(|l| l.as_str()).collect(),
        default_language: Language::default().as_str(),
        sample_rates: SampleRate::ALL.iter().map(|r| r.as_u32()).collect(),
        default_sample_rate: SampleRate::default().as_u32(),
        default_voice_id: DEFAULT_VOICE_ID,
        speed: RangeInfo {
            min: SPEED_RANGE.0,
            max: SPEED_RANGE.1,
            default: DEFAULT_SPEED,
            step: 0.1,
        },
        volume: RangeInfo {
            min: VOLUME_RANGE.0,
            max: VOLUME_RANGE.1,
            default: DEFAULT_VOLUME,
            step: 0.5,
        },
    })
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(state.metrics.snapshot())
}

pub async fn tts_endpoint(
    State(state): State<AppState>,
    form: Result<Json<SynthesisForm>, JsonRejection>,
) -> Result<Json<TtsResponse>, ApiError> {
    let container = synthesize_form(&state, form).await?;
    Ok(Json(TtsResponse {
        audio_base64: container.to_base64(),
        duration_ms: container.duration_ms(),
        sample_rate: container.sample_rate().as_u32(),
    }))
}

pub async fn tts_wav_endpoint(
    State(state): State<AppState>,
    form: Result<Json<SynthesisForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let container = synthesize_form(&state, form).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"speech.wav\""),
        ],
        container.into_bytes(),
    ))
}

/// Validate, synthesize and record the outcome of one request.
async fn synthesize_form(
    state: &AppState,
    form: Result<Json<SynthesisForm>, JsonRejection>,
) -> Result<AudioContainer, ApiError> {
    let start_time = Instant::now();
    let result = match form {
        Ok(Json(form)) => run_synthesis(state, form).await,
        Err(rejection) => Err(ApiError::from(rejection)),
    };
    let latency_ms = start_time.elapsed().as_millis() as u64;

    match &result {
        Ok(container) => {
            state
                .metrics
                .record(Outcome::Success, latency_ms, container.as_bytes().len());
            info!(
                "Synthesis served in {}ms: {} ms of audio",
                latency_ms,
                container.duration_ms()
            );
        }
        Err(e) => state.metrics.record(e.outcome(), latency_ms, 0),
    }
    result
}

async fn run_synthesis(state: &AppState, form: SynthesisForm) -> Result<AudioContainer, ApiError> {
    let (credentials, request) = validate_synthesis_form(&form)?;

    info!(
        "Synthesis request: text_len={}, voice={}, language={}, sample_rate={}, sdk_app_id={}",
        request.text().chars().count(),
        request.voice().voice_id,
        request.voice().language,
        request.sample_rate(),
        request.sdk_app_id()
    );

    // The remote stream is read with blocking I/O
    let backend = state.backend.clone();
    let result = tokio::time::timeout(
        state.config.synth_timeout(),
        tokio::task::spawn_blocking(move || backend.synthesize(credentials, &request)),
    )
    .await;

    match result {
        Ok(Ok(Ok(container))) => Ok(container),
        Ok(Ok(Err(e))) => Err(ApiError::from(e)),
        Ok(Err(join_err)) => {
            error!("Synthesis task join error: {join_err}");
            Err(ApiError::InternalError(format!("Task join error: {join_err}")))
        }
        Err(_) => Err(ApiError::Timeout(state.config.synth_timeout_secs)),
    }
}
