//! Common utilities for integration tests

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use server::{app, config::ServerConfig, AppState, SpeechBackend};
use tower::ServiceExt;
use trtc_client::{ClientError, Credentials};
use tts_core::{assemble, AudioContainer, SynthesisRequest};

/// What the scripted backend does when called
pub enum Script {
    /// Assemble these raw event payloads
    Events(Vec<String>),
    /// Fail with a remote error carrying this text
    RemoteError(&'static str),
    /// Block longer than the handler's timeout
    Hang(Duration),
}

pub struct ScriptedBackend {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpeechBackend for ScriptedBackend {
    fn synthesize(
        &self,
        _credentials: Credentials,
        request: &SynthesisRequest,
    ) -> Result<AudioContainer, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Events(events) => {
                let pcm = assemble(events)?;
                Ok(pcm.into_container(request.sample_rate())?)
            }
            Script::RemoteError(text) => Err(ClientError::classify(*text)),
            Script::Hang(duration) => {
                std::thread::sleep(*duration);
                Err(ClientError::Api("hung".to_string()))
            }
        }
    }
}

/// Create a test app instance backed by a scripted backend
pub fn create_test_app(script: Script) -> (Router, Arc<ScriptedBackend>) {
    let backend = Arc::new(ScriptedBackend {
        script,
        calls: AtomicUsize::new(0),
    });
    let config = ServerConfig {
        synth_timeout_secs: 1,
        ..ServerConfig::default()
    };
    let state = AppState::new(backend.clone(), config);
    (app(state), backend)
}

pub fn audio_event(bytes: &[u8], end: bool) -> String {
    format!(
        r#"{{"Type":"audio","Audio":"{}","IsEnd":{}}}"#,
        general_purpose::STANDARD.encode(bytes),
        end
    )
}

pub fn valid_form() -> serde_json::Value {
    serde_json::json!({
        "text": "你好，欢迎使用语音合成",
        "secret_id": "AKIDxxxxxxxx",
        "secret_key": "xxxxxxxx",
        "sdk_app_id": "1400000000",
        "sample_rate": "16000"
    })
}

pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, HeaderMap, Bytes) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

pub fn error_message(body: &Bytes) -> String {
    let value: serde_json::Value = serde_json::from_slice(body).unwrap();
    value["error"].as_str().unwrap().to_string()
}
