use serde::Deserialize;
use thiserror::Error;
use tts_core::AssembleError;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Request limit exceeded: {0}")]
    RateLimited(String),

    #[error("No audio received from the stream")]
    NoAudio,

    #[error("Remote API error: {0}")]
    Api(String),

    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    #[error("Request signing error: {0}")]
    Signing(String),

    #[error("Request encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stream read error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Audio container error: {0}")]
    Container(AssembleError),
}

impl From<AssembleError> for ClientError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::NoAudio => ClientError::NoAudio,
            other => ClientError::Container(other),
        }
    }
}

impl ClientError {
    /// Classify a remote error by the text it carries.
    pub fn classify(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.contains("AuthFailure") {
            ClientError::AuthFailure(text)
        } else if text.contains("InvalidParameter") {
            ClientError::InvalidParameter(text)
        } else if text.contains("RequestLimitExceeded") {
            ClientError::RateLimited(text)
        } else {
            ClientError::Api(text)
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout(),
            ClientError::Stream(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorEnvelope {
    response: ErrorBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    error: Option<RemoteError>,
    request_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteError {
    code: String,
    message: String,
}

/// Turn a non-stream response body into an error.
pub(crate) fn from_response(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            response:
                ErrorBody {
                    error: Some(err),
                    request_id,
                },
        }) => ClientError::classify(format!(
            "{}: {} (RequestId: {})",
            err.code,
            err.message,
            request_id.as_deref().unwrap_or("-")
        )),
        _ => {
            let snippet: String = body.chars().take(200).collect();
            ClientError::Api(format!("unexpected response (HTTP {status}): {snippet}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_substring() {
        assert!(matches!(
            ClientError::classify("code:AuthFailure.SignatureFailure message:bad"),
            ClientError::AuthFailure(_)
        ));
        assert!(matches!(
            ClientError::classify("InvalidParameterValue.Text"),
            ClientError::InvalidParameter(_)
        ));
        assert!(matches!(
            ClientError::classify("RequestLimitExceeded"),
            ClientError::RateLimited(_)
        ));
        assert!(matches!(
            ClientError::classify("InternalError"),
            ClientError::Api(_)
        ));
    }

    #[test]
    fn test_invalid_parameter_keeps_remote_text() {
        match ClientError::classify("InvalidParameter: VoiceId not found") {
            ClientError::InvalidParameter(text) => assert!(text.contains("VoiceId not found")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_structured_error_body() {
        let body = r#"{"Response":{"Error":{"Code":"AuthFailure.SecretIdNotFound","Message":"The SecretId is not found"},"RequestId":"abc-123"}}"#;
        match from_response(200, body) {
            ClientError::AuthFailure(text) => {
                assert!(text.contains("SecretIdNotFound"));
                assert!(text.contains("abc-123"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_body() {
        let err = from_response(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, ClientError::Api(ref t) if t.contains("502")));
    }

    #[test]
    fn test_no_audio_conversion() {
        assert!(matches!(
            ClientError::from(AssembleError::NoAudio),
            ClientError::NoAudio
        ));
        assert!(matches!(
            ClientError::from(AssembleError::TooLarge(1)),
            ClientError::Container(_)
        ));
    }
}
