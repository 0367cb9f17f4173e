// Configuration for the remote synthesis API

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://trtc.ai.tencentcloudapi.com";
pub const DEFAULT_REGION: &str = "ap-beijing";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Service name used in the credential scope
pub const SERVICE: &str = "trtc";
pub const ACTION: &str = "TextToSpeechSSE";
pub const VERSION: &str = "2019-07-22";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub region: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            region: DEFAULT_REGION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("TRTC_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let region = std::env::var("TRTC_REGION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let timeout_secs = std::env::var("TRTC_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url,
            region,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
