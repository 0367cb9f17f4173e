use serde::Deserialize;
use trtc_client::Credentials;
use tts_core::{
    Language, SampleRate, SynthesisRequest, Voice, DEFAULT_SPEED, DEFAULT_VOICE_ID,
    DEFAULT_VOLUME, MAX_TEXT_LENGTH, SPEED_RANGE, VOLUME_RANGE,
};

use crate::error::ApiError;

/// A numeric form field that may arrive as a JSON number or as text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormNumber {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl FormNumber {
    fn as_u64(&self) -> Option<u64> {
        match self {
            FormNumber::Integer(n) => Some(*n),
            FormNumber::Float(_) => None,
            FormNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<u64> for FormNumber {
    fn from(n: u64) -> Self {
        FormNumber::Integer(n)
    }
}

impl From<&str> for FormNumber {
    fn from(s: &str) -> Self {
        FormNumber::Text(s.to_string())
    }
}

/// Synthesis form as submitted by the caller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SynthesisForm {
    pub text: String,
    pub secret_id: String,
    pub secret_key: String,
    pub sdk_app_id: Option<FormNumber>,
    pub voice_id: Option<String>,
    pub speed: Option<f32>,
    pub volume: Option<f32>,
    pub language: Option<String>,
    pub sample_rate: Option<FormNumber>,
}

/// Validate a synthesis form and build the request for it.
///
/// Nothing here touches the network; every rejection happens before the
/// remote call.
pub fn validate_synthesis_form(
    form: &SynthesisForm,
) -> Result<(Credentials, SynthesisRequest), ApiError> {
    validate_text(&form.text)?;

    let secret_id = form.secret_id.trim();
    let secret_key = form.secret_key.trim();
    let sdk_app_id_missing = match &form.sdk_app_id {
        None => true,
        Some(FormNumber::Text(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if secret_id.is_empty() || secret_key.is_empty() || sdk_app_id_missing {
        return Err(ApiError::InvalidInput(
            "Credentials incomplete: SecretId, SecretKey and SdkAppId are required".to_string(),
        ));
    }

    let sdk_app_id = form.sdk_app_id.as_ref().and_then(FormNumber::as_u64);
    let sample_rate_hz = match &form.sample_rate {
        None => Some(SampleRate::default().as_u32() as u64),
        Some(n) => n.as_u64(),
    };
    let (Some(sdk_app_id), Some(sample_rate_hz)) = (sdk_app_id, sample_rate_hz) else {
        return Err(ApiError::InvalidInput(
            "SdkAppId and sample rate must be numeric".to_string(),
        ));
    };

    let sample_rate = u32::try_from(sample_rate_hz)
        .ok()
        .and_then(|hz| SampleRate::try_from(hz).ok())
        .ok_or_else(|| {
            ApiError::InvalidInput(format!(
                "Unsupported sample rate: {sample_rate_hz} (expected 16000 or 24000)"
            ))
        })?;

    let voice = validate_voice(form)?;

    Ok((
        Credentials::new(secret_id, secret_key),
        SynthesisRequest::new(&form.text, voice, sample_rate, sdk_app_id),
    ))
}

fn validate_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::InvalidInput("Text cannot be empty".to_string()));
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "Text too long: {len} characters (max {MAX_TEXT_LENGTH})"
        )));
    }
    Ok(())
}

fn validate_voice(form: &SynthesisForm) -> Result<Voice, ApiError> {
    let speed = form.speed.unwrap_or(DEFAULT_SPEED);
    if !(SPEED_RANGE.0..=SPEED_RANGE.1).contains(&speed) {
        return Err(ApiError::InvalidInput(format!(
            "Speed must be between {} and {}",
            SPEED_RANGE.0, SPEED_RANGE.1
        )));
    }

    let volume = form.volume.unwrap_or(DEFAULT_VOLUME);
    if !(VOLUME_RANGE.0..=VOLUME_RANGE.1).contains(&volume) {
        return Err(ApiError::InvalidInput(format!(
            "Volume must be between {} and {}",
            VOLUME_RANGE.0, VOLUME_RANGE.1
        )));
    }

    let language = match form.language.as_deref().map(str::trim) {
        None | Some("") => Language::default(),
        Some(tag) => tag.parse::<Language>().map_err(|tag| {
            let supported: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
            ApiError::InvalidInput(format!(
                "Unsupported language: {tag} (expected one of {})",
                supported.join(", ")
            ))
        })?,
    };

    let voice_id = form
        .voice_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_VOICE_ID)
        .to_string();

    Ok(Voice {
        voice_id,
        speed,
        volume,
        language,
    })
}
