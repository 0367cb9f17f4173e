//! Request model for the streaming synthesis call.
//!
//! A [`SynthesisRequest`] is built once per call and serializes to the exact
//! JSON body the remote `TextToSpeechSSE` action expects.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Model name sent with every request
pub const MODEL: &str = "flow_01_turbo";
/// Maximum text length, in characters
pub const MAX_TEXT_LENGTH: usize = 2000;
pub const DEFAULT_VOICE_ID: &str = "v-female-R2s4N9qJ";
pub const DEFAULT_SPEED: f32 = 1.0;
pub const DEFAULT_VOLUME: f32 = 1.0;
pub const SPEED_RANGE: (f32, f32) = (0.5, 2.0);
pub const VOLUME_RANGE: (f32, f32) = (0.0, 10.0);

/// Output sample rates the remote API can produce as PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleRate {
    Hz16000,
    #[default]
    Hz24000,
}

impl SampleRate {
    pub const ALL: [SampleRate; 2] = [SampleRate::Hz16000, SampleRate::Hz24000];

    pub fn as_u32(self) -> u32 {
        match self {
            SampleRate::Hz16000 => 16_000,
            SampleRate::Hz24000 => 24_000,
        }
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = u32;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        match hz {
            16_000 => Ok(SampleRate::Hz16000),
            24_000 => Ok(SampleRate::Hz24000),
            other => Err(other),
        }
    }
}

impl Serialize for SampleRate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_u32())
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Language tags accepted by the voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
    Yue,
    Ja,
    Ko,
    Auto,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Zh,
        Language::En,
        Language::Yue,
        Language::Ja,
        Language::Ko,
        Language::Auto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
            Language::Yue => "yue",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Auto => "auto",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice settings, serialized as the `Voice` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Voice {
    pub voice_id: String,
    pub speed: f32,
    pub volume: f32,
    pub language: Language,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            voice_id: DEFAULT_VOICE_ID.to_string(),
            speed: DEFAULT_SPEED,
            volume: DEFAULT_VOLUME,
            language: Language::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AudioFormat {
    format: &'static str,
    sample_rate: SampleRate,
}

/// Body of one `TextToSpeechSSE` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SynthesisRequest {
    model: &'static str,
    text: String,
    voice: Voice,
    audio_format: AudioFormat,
    sdk_app_id: u64,
}

impl SynthesisRequest {
    /// Build a request. The text is trimmed; callers validate length first.
    pub fn new(text: &str, voice: Voice, sample_rate: SampleRate, sdk_app_id: u64) -> Self {
        Self {
            model: MODEL,
            text: text.trim().to_string(),
            voice,
            audio_format: AudioFormat {
                format: "pcm",
                sample_rate,
            },
            sdk_app_id,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.audio_format.sample_rate
    }

    pub fn sdk_app_id(&self) -> u64 {
        self.sdk_app_id
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
