//! Fallback-and-retry orchestration for a single metric
//!
//! Candidates are tried in order; transient upstream failures are retried
//! in place with linear backoff, logical failures (empty or non-JSON
//! bodies served with a 2xx) move straight to the next candidate, and an
//! expired session aborts the whole metric. A populated payload from any
//! candidate short-circuits the chain.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::canonical::Availability;
use crate::client::{SessionToken, VendorClient};
use crate::error::{HunoError, Result};
use crate::fetch::candidates::{EndpointCandidate, Metric, UserIds};
use crate::fetch::telemetry::{mask_auth_value, FetchTelemetry};

/// Retries per candidate after the first attempt
const DEFAULT_RETRY_CEILING: u32 = 2;
/// Backoff unit; the nth retry sleeps n times this
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Outcome of fetching one metric through its fallback chain
#[derive(Debug, Clone)]
pub struct MetricFetch {
    pub availability: Availability,
    pub data: Option<Value>,
}

impl MetricFetch {
    pub fn available(data: Value) -> Self {
        Self {
            availability: Availability::Available,
            data: Some(data),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            availability: Availability::Unavailable,
            data: None,
        }
    }

    pub fn error() -> Self {
        Self {
            availability: Availability::Error,
            data: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }
}

/// How a single candidate attempt ended
enum AttemptOutcome {
    /// Populated payload; the chain is done
    Success(Value),
    /// 2xx with an unusable body; no retry, next candidate
    LogicalFailure(String),
    /// Candidate exhausted its retries on transient upstream statuses
    TransientExhausted,
    /// Candidate exhausted its retries on transport failures
    TransportExhausted,
}

/// Drives a metric's candidate chain against the vendor client
pub struct Orchestrator<'a> {
    client: &'a VendorClient,
    token: &'a SessionToken,
    telemetry: &'a FetchTelemetry,
    retry_ceiling: u32,
    base_delay: Duration,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        client: &'a VendorClient,
        token: &'a SessionToken,
        telemetry: &'a FetchTelemetry,
    ) -> Self {
        Self {
            client,
            token,
            telemetry,
            retry_ceiling: DEFAULT_RETRY_CEILING,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Override backoff timing; used by tests to avoid real sleeps
    pub fn with_backoff(mut self, retry_ceiling: u32, base_delay: Duration) -> Self {
        self.retry_ceiling = retry_ceiling;
        self.base_delay = base_delay;
        self
    }

    /// Fetch one metric through its ordered fallback chain.
    ///
    /// The attempt space is candidates crossed with dates, candidate-major:
    /// an endpoint that answered for one date is the same endpoint for the
    /// next, so the caller's most-likely candidate is fully explored before
    /// moving on. Returns `Err` only for `AuthExpired`; every other failure
    /// mode is folded into the `MetricFetch` availability so one flaky
    /// endpoint cannot sink a whole dashboard refresh.
    pub async fn fetch_metric(
        &self,
        metric: Metric,
        candidates: &[EndpointCandidate],
        ids: &UserIds,
        dates: &[NaiveDate],
    ) -> Result<MetricFetch> {
        let feature = metric.feature_name();
        let mut last_hard_failure = false;

        for (index, candidate) in candidates.iter().enumerate() {
            for date in dates {
                let Some(spec) = candidate.request(ids, *date) else {
                    debug!(feature, candidate = index, "candidate skipped: missing user id");
                    break;
                };

                match self.try_candidate(feature, &spec.path, &spec.query).await? {
                    AttemptOutcome::Success(data) => {
                        debug!(feature, candidate = index, "metric resolved");
                        return Ok(MetricFetch::available(data));
                    }
                    AttemptOutcome::LogicalFailure(reason) => {
                        debug!(feature, candidate = index, reason = %reason, "candidate rejected");
                        last_hard_failure = false;
                    }
                    AttemptOutcome::TransientExhausted => {
                        last_hard_failure = false;
                    }
                    AttemptOutcome::TransportExhausted => {
                        last_hard_failure = true;
                    }
                }
            }
        }

        if last_hard_failure {
            Ok(MetricFetch::error())
        } else {
            Ok(MetricFetch::unavailable())
        }
    }

    /// Run one candidate to completion, retrying transient failures in place
    async fn try_candidate(
        &self,
        feature: &str,
        path: &str,
        query: &[(String, String)],
    ) -> Result<AttemptOutcome> {
        let mut retries = 0u32;

        loop {
            debug!(
                feature,
                path,
                retries,
                authorization = %mask_auth_value(&self.token.authorization_header()),
                "attempt start"
            );
            let started = Instant::now();
            let result = self.client.get_raw(self.token, path, query).await;
            let latency = started.elapsed();

            match result {
                Ok(raw) => {
                    let status = raw.status;
                    debug!(
                        feature,
                        path,
                        status,
                        bytes = raw.size(),
                        latency_ms = latency.as_millis() as u64,
                        "attempt response"
                    );
                    return match classify_payload(&raw.body, raw.content_type.as_deref()) {
                        PayloadClass::Populated(value) => {
                            self.telemetry.record_success(feature, status, latency);
                            Ok(AttemptOutcome::Success(value))
                        }
                        PayloadClass::Empty(reason) => {
                            self.telemetry
                                .record_error(feature, Some(status), &reason, latency);
                            Ok(AttemptOutcome::LogicalFailure(reason))
                        }
                    };
                }
                Err(HunoError::AuthExpired) => {
                    self.telemetry
                        .record_error(feature, Some(401), "session expired", latency);
                    return Err(HunoError::AuthExpired);
                }
                Err(err @ HunoError::UpstreamTransient { status }) => {
                    self.telemetry
                        .record_error(feature, Some(status), &err.to_string(), latency);
                    if retries >= self.retry_ceiling {
                        return Ok(AttemptOutcome::TransientExhausted);
                    }
                    retries += 1;
                    tokio::time::sleep(self.base_delay * retries).await;
                }
                Err(HunoError::Http(err)) => {
                    self.telemetry
                        .record_error(feature, None, &err.to_string(), latency);
                    if retries >= self.retry_ceiling {
                        return Ok(AttemptOutcome::TransportExhausted);
                    }
                    retries += 1;
                    tokio::time::sleep(self.base_delay * retries).await;
                }
                Err(err) => {
                    self.telemetry
                        .record_error(feature, None, &err.to_string(), latency);
                    return Ok(AttemptOutcome::LogicalFailure(err.to_string()));
                }
            }
        }
    }
}

/// Classification of a 2xx body before handing it downstream
enum PayloadClass {
    Populated(Value),
    Empty(String),
}

/// A 2xx does not mean data. The vendor serves empty objects, empty arrays,
/// nulls, and whole HTML challenge pages with a 200 when it declines a
/// request, and each of those means "try the next candidate".
fn classify_payload(body: &str, content_type: Option<&str>) -> PayloadClass {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return PayloadClass::Empty("empty body".to_string());
    }

    let looks_like_html = content_type
        .map(|ct| ct.contains("text/html"))
        .unwrap_or(false)
        || trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html");
    if looks_like_html {
        return PayloadClass::Empty("html challenge page".to_string());
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return PayloadClass::Empty("unparseable body".to_string()),
    };

    match &value {
        Value::Null => PayloadClass::Empty("null payload".to_string()),
        Value::Object(map) if map.is_empty() => PayloadClass::Empty("empty object".to_string()),
        Value::Array(items) if items.is_empty() => PayloadClass::Empty("empty array".to_string()),
        _ => PayloadClass::Populated(value),
    }
}
