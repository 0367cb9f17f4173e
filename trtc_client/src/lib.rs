//! Blocking client for the `TextToSpeechSSE` API.
//!
//! Each call signs one JSON request with the caller's own credentials,
//! reads the event stream lazily and assembles the audio fragments.

pub mod config;
mod error;
pub mod sign;
pub mod sse;

use std::{fmt, io::BufReader};

use chrono::Utc;
use reqwest::{
    blocking::{Client, Response},
    header::{AUTHORIZATION, CONTENT_TYPE},
    Url,
};
use tracing::{debug, info};
use tts_core::{try_assemble, AudioContainer, SynthesisRequest};

pub use config::ClientConfig;
pub use error::ClientError;
pub use sse::{SseEvent, SseEvents};

/// Event stream of one synthesis call
pub type EventStream = SseEvents<BufReader<Response>>;

/// Caller-supplied API key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    secret_id: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

// Manual Debug so the secret key never reaches a log line
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

pub struct TrtcClient {
    http: Client,
    credentials: Credentials,
    config: ClientConfig,
    url: Url,
    host: String,
}

impl TrtcClient {
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, ClientError> {
        let url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::Endpoint(format!("{}: {e}", config.base_url)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ClientError::Endpoint(format!("{}: missing host", config.base_url))),
        };
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            credentials,
            config,
            url,
            host,
        })
    }

    /// Send the request and return the lazily read event stream.
    ///
    /// Remote errors arrive as a plain JSON body instead of a stream and are
    /// classified here.
    pub fn open_stream(&self, request: &SynthesisRequest) -> Result<EventStream, ClientError> {
        let payload = request.to_json()?;
        let now = Utc::now();
        let authorization = sign::authorization(&self.credentials, &self.host, &payload, now)?;

        debug!(
            "POST {} action={} region={} text_len={}",
            self.url,
            config::ACTION,
            self.config.region,
            request.text().chars().count()
        );

        let response = self
            .http
            .post(self.url.clone())
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, sign::CONTENT_TYPE)
            .header("X-TC-Action", config::ACTION)
            .header("X-TC-Version", config::VERSION)
            .header("X-TC-Timestamp", now.timestamp().to_string())
            .header("X-TC-Region", self.config.region.as_str())
            .body(payload)
            .send()?;

        let is_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/event-stream"))
            .unwrap_or(false);
        if is_stream {
            return Ok(SseEvents::new(BufReader::new(response)));
        }

        let status = response.status().as_u16();
        let body = response.text()?;
        Err(error::from_response(status, &body))
    }

    /// Run one synthesis call and return the finished WAV container.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioContainer, ClientError> {
        let events = self.open_stream(request)?;
        let pcm = try_assemble(events.map(|e| e.map(|event| event.data).map_err(ClientError::from)))?;
        let container = pcm.into_container(request.sample_rate())?;

        info!(
            "Synthesis complete: {} bytes, {} ms at {} Hz",
            container.as_bytes().len(),
            container.duration_ms(),
            container.sample_rate()
        );
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use std::{io::Read, sync::mpsc, thread};
    use tts_core::{SampleRate, Voice};

    struct Captured {
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Serve exactly one request with the given content type and body.
    fn serve_once(content_type: &'static str, body: String) -> (String, mpsc::Receiver<Captured>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut req_body = String::new();
            request.as_reader().read_to_string(&mut req_body).unwrap();
            let headers = request
                .headers()
                .iter()
                .map(|h| (h.field.as_str().to_string(), h.value.as_str().to_string()))
                .collect();
            tx.send(Captured {
                headers,
                body: req_body,
            })
            .unwrap();

            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap();
            let response = tiny_http::Response::from_data(body.into_bytes()).with_header(header);
            request.respond(response).unwrap();
        });

        (format!("http://127.0.0.1:{port}"), rx)
    }

    fn client_for(base_url: String) -> TrtcClient {
        let config = ClientConfig {
            base_url,
            ..ClientConfig::default()
        };
        TrtcClient::new(Credentials::new("AKIDtest", "secret"), config).unwrap()
    }

    fn request() -> SynthesisRequest {
        SynthesisRequest::new("你好", Voice::default(), SampleRate::Hz16000, 1400000000)
    }

    fn audio_line(bytes: &[u8], end: bool) -> String {
        format!(
            "data: {{\"Type\":\"audio\",\"Audio\":\"{}\",\"IsEnd\":{}}}\n\n",
            general_purpose::STANDARD.encode(bytes),
            end
        )
    }

    #[test]
    fn test_synthesize_over_stream() {
        let body = format!(
            "{}data: not-json\n\n{}{}",
            audio_line(&[1, 0, 2, 0], false),
            audio_line(&[3, 0, 4, 0], true),
            audio_line(&[9, 9], false)
        );
        let (url, rx) = serve_once("text/event-stream", body);

        let container = client_for(url).synthesize(&request()).unwrap();
        assert_eq!(container.pcm(), &[1, 0, 2, 0, 3, 0, 4, 0]);
        assert_eq!(container.sample_rate(), SampleRate::Hz16000);

        let captured = rx.recv().unwrap();
        assert_eq!(captured.header("X-TC-Action"), Some("TextToSpeechSSE"));
        assert_eq!(captured.header("X-TC-Version"), Some("2019-07-22"));
        assert_eq!(captured.header("X-TC-Region"), Some("ap-beijing"));
        assert!(captured
            .header("Authorization")
            .unwrap()
            .starts_with("TC3-HMAC-SHA256 Credential=AKIDtest/"));

        let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent["Model"], "flow_01_turbo");
        assert_eq!(sent["Text"], "你好");
        assert_eq!(sent["AudioFormat"]["SampleRate"], 16000);
        assert_eq!(sent["SdkAppId"], 1400000000u64);
    }

    #[test]
    fn test_stream_without_audio() {
        let body = "data: {\"Type\":\"end\",\"IsEnd\":true}\n\n".to_string();
        let (url, _rx) = serve_once("text/event-stream", body);

        let err = client_for(url).synthesize(&request()).unwrap_err();
        assert!(matches!(err, ClientError::NoAudio));
    }

    #[test]
    fn test_remote_error_is_classified() {
        let body = r#"{"Response":{"Error":{"Code":"RequestLimitExceeded","Message":"slow down"},"RequestId":"r-1"}}"#;
        let (url, _rx) = serve_once("application/json", body.to_string());

        let err = client_for(url).synthesize(&request()).unwrap_err();
        assert!(matches!(err, ClientError::RateLimited(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        let err = TrtcClient::new(Credentials::new("a", "b"), config).err().unwrap();
        assert!(matches!(err, ClientError::Endpoint(_)));
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let shown = format!("{:?}", Credentials::new("AKIDvisible", "very-secret"));
        assert!(shown.contains("AKIDvisible"));
        assert!(!shown.contains("very-secret"));
    }
}
