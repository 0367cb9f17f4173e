// Metrics collection and tracking

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

const LATENCY_WINDOW: usize = 1000;

/// How a synthesis request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    InvalidInput,
    AuthFailure,
    InvalidParameter,
    RateLimited,
    NoAudio,
    Timeout,
    Failed,
}

#[derive(Debug, Default)]
struct OutcomeCounters {
    success: AtomicU64,
    invalid_input: AtomicU64,
    auth_failure: AtomicU64,
    invalid_parameter: AtomicU64,
    rate_limited: AtomicU64,
    no_audio: AtomicU64,
    timeout: AtomicU64,
    failed: AtomicU64,
}

impl OutcomeCounters {
    fn counter(&self, outcome: Outcome) -> &AtomicU64 {
        match outcome {
            Outcome::Success => &self.success,
            Outcome::InvalidInput => &self.invalid_input,
            Outcome::AuthFailure => &self.auth_failure,
            Outcome::InvalidParameter => &self.invalid_parameter,
            Outcome::RateLimited => &self.rate_limited,
            Outcome::NoAudio => &self.no_audio,
            Outcome::Timeout => &self.timeout,
            Outcome::Failed => &self.failed,
        }
    }
}

/// Synthesis metrics shared by all handlers
#[derive(Debug)]
pub struct AppMetrics {
    started: Instant,
    request_count: AtomicU64,
    outcomes: OutcomeCounters,
    audio_bytes: AtomicU64,
    total_latency_ms: AtomicU64,
    max_latency_ms: AtomicU64,
    // Only requests that reached the backend; keeps the last LATENCY_WINDOW
    latency_samples: Mutex<VecDeque<u64>>,
}

impl AppMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            request_count: AtomicU64::new(0),
            outcomes: OutcomeCounters::default(),
            audio_bytes: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            max_latency_ms: AtomicU64::new(0),
            latency_samples: Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW)),
        }
    }

    pub fn record(&self, outcome: Outcome, latency_ms: u64, audio_bytes: usize) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.outcomes.counter(outcome).fetch_add(1, Ordering::Relaxed);
        self.audio_bytes.fetch_add(audio_bytes as u64, Ordering::Relaxed);

        if outcome == Outcome::InvalidInput {
            return;
        }

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.max_latency_ms.fetch_max(latency_ms, Ordering::Relaxed);

        if let Ok(mut samples) = self.latency_samples.lock() {
            if samples.len() == LATENCY_WINDOW {
                samples.pop_front();
            }
            samples.push_back(latency_ms);
        }
    }

    fn percentile(&self, p: u8) -> u64 {
        let Ok(samples) = self.latency_samples.lock() else {
            return 0;
        };
        if samples.is_empty() {
            return 0;
        }
        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();
        let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
        sorted[index]
    }

    pub fn snapshot(&self) -> MetricsResponse {
        let load = |outcome| self.outcomes.counter(outcome).load(Ordering::Relaxed);
        let request_count = self.request_count.load(Ordering::Relaxed);
        let remote_calls = request_count.saturating_sub(load(Outcome::InvalidInput));
        let avg_latency_ms = if remote_calls == 0 {
            0.0
        } else {
            self.total_latency_ms.load(Ordering::Relaxed) as f64 / remote_calls as f64
        };

        MetricsResponse {
            uptime_seconds: self.started.elapsed().as_secs(),
            request_count,
            audio_bytes: self.audio_bytes.load(Ordering::Relaxed),
            outcomes: OutcomeStats {
                success: load(Outcome::Success),
                invalid_input: load(Outcome::InvalidInput),
                auth_failure: load(Outcome::AuthFailure),
                invalid_parameter: load(Outcome::InvalidParameter),
                rate_limited: load(Outcome::RateLimited),
                no_audio: load(Outcome::NoAudio),
                timeout: load(Outcome::Timeout),
                failed: load(Outcome::Failed),
            },
            latency: LatencyStats {
                avg_ms: avg_latency_ms,
                max_ms: self.max_latency_ms.load(Ordering::Relaxed),
                p50_ms: self.percentile(50),
                p95_ms: self.percentile(95),
                p99_ms: self.percentile(99),
            },
        }
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub request_count: u64,
    pub audio_bytes: u64,
    pub outcomes: OutcomeStats,
    pub latency: LatencyStats,
}

#[derive(Debug, Serialize)]
pub struct OutcomeStats {
    pub success: u64,
    pub invalid_input: u64,
    pub auth_failure: u64,
    pub invalid_parameter: u64,
    pub rate_limited: u64,
    pub no_audio: u64,
    pub timeout: u64,
    pub failed: u64,
}

#[derive(Debug, Serialize)]
pub struct LatencyStats {
    pub avg_ms: f64,
    pub max_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_outcome() {
        let metrics = AppMetrics::new();
        metrics.record(Outcome::Success, 100, 1044);
        metrics.record(Outcome::Success, 300, 44);
        metrics.record(Outcome::NoAudio, 50, 0);
        metrics.record(Outcome::InvalidInput, 0, 0);

        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 4);
        assert_eq!(snap.outcomes.success, 2);
        assert_eq!(snap.outcomes.no_audio, 1);
        assert_eq!(snap.outcomes.invalid_input, 1);
        assert_eq!(snap.audio_bytes, 1088);
        assert_eq!(snap.latency.max_ms, 300);
        assert_eq!(snap.latency.avg_ms, 150.0);
    }

    #[test]
    fn test_latency_window_is_bounded() {
        let metrics = AppMetrics::new();
        for i in 0..(LATENCY_WINDOW as u64 + 10) {
            metrics.record(Outcome::Failed, i, 0);
        }
        assert_eq!(metrics.latency_samples.lock().unwrap().len(), LATENCY_WINDOW);
        // window holds 10..=1009
        assert_eq!(metrics.percentile(50), 510);
        assert_eq!(metrics.percentile(99), 1000);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = AppMetrics::new().snapshot();
        assert_eq!(snap.request_count, 0);
        assert_eq!(snap.latency.avg_ms, 0.0);
        assert_eq!(snap.latency.p50_ms, 0);
    }
}
