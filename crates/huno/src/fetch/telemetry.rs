//! Per-feature fetch telemetry
//!
//! Counts outcomes and tracks latency per logical feature so that a single
//! summary line can answer "which metric is flaky today" without trawling
//! request logs. Latency history is capped; p95 is computed over the most
//! recent window only.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

/// Number of recent latency samples retained per feature
const LATENCY_WINDOW: usize = 100;

/// Aggregated outcome counters for one feature
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureSummary {
    pub success_count: u64,
    pub error_count: u64,
    /// Last HTTP status observed, success or failure
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    #[serde(skip)]
    latencies: Vec<u64>,
}

impl FeatureSummary {
    fn record_latency(&mut self, latency: Duration) {
        if self.latencies.len() >= LATENCY_WINDOW {
            self.latencies.remove(0);
        }
        self.latencies.push(latency.as_millis() as u64);
    }

    /// p95 latency in milliseconds over the retained window
    pub fn p95_latency_ms(&self) -> Option<u64> {
        if self.latencies.is_empty() {
            return None;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let rank = ((sorted.len() as f64) * 0.95).ceil() as usize;
        Some(sorted[rank.saturating_sub(1)])
    }

    pub fn sample_count(&self) -> usize {
        self.latencies.len()
    }
}

/// Shared telemetry collector for all fetch operations.
///
/// Interior mutability keeps the recording call sites free of `&mut`
/// plumbing through the orchestrator.
#[derive(Debug, Default)]
pub struct FetchTelemetry {
    features: Mutex<HashMap<String, FeatureSummary>>,
}

impl FetchTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful fetch for a feature
    pub fn record_success(&self, feature: &str, status: u16, latency: Duration) {
        debug!(feature, status, latency_ms = latency.as_millis() as u64, "fetch ok");
        if let Ok(mut features) = self.features.lock() {
            let entry = features.entry(feature.to_string()).or_default();
            entry.success_count += 1;
            entry.last_status = Some(status);
            entry.record_latency(latency);
        }
    }

    /// Record a failed fetch for a feature
    pub fn record_error(
        &self,
        feature: &str,
        status: Option<u16>,
        error: &str,
        latency: Duration,
    ) {
        warn!(
            feature,
            status,
            latency_ms = latency.as_millis() as u64,
            error,
            "fetch failed"
        );
        if let Ok(mut features) = self.features.lock() {
            let entry = features.entry(feature.to_string()).or_default();
            entry.error_count += 1;
            if status.is_some() {
                entry.last_status = status;
            }
            entry.last_error = Some(error.to_string());
            entry.record_latency(latency);
        }
    }

    /// Snapshot of all feature summaries
    pub fn summary(&self) -> HashMap<String, FeatureSummary> {
        self.features
            .lock()
            .map(|features| features.clone())
            .unwrap_or_default()
    }
}

/// Redact bearer tokens and cookie values before they can reach a log line
pub fn mask_auth_value(value: &str) -> String {
    match value.split_once(' ') {
        Some((scheme, _)) => format!("{} ***", scheme),
        None => "***".to_string(),
    }
}
