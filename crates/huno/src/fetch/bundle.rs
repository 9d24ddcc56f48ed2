//! Daily bundle assembly
//!
//! Fetches the full set of wellness metrics for one day, plus a rolling
//! history window, under a wall-clock budget. Metrics run concurrently in
//! small chunks; whatever the budget cuts off is reported as unavailable
//! rather than failing the bundle.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::{SessionToken, VendorClient};
use crate::error::{HunoError, Result};
use crate::fetch::candidates::{default_candidates, Metric, UserIds};
use crate::fetch::orchestrator::{MetricFetch, Orchestrator};
use crate::fetch::telemetry::FetchTelemetry;

/// Metrics fetched concurrently per batch
const CHUNK_SIZE: usize = 5;
/// Default wall-clock budget for a whole bundle
pub const DEFAULT_FETCH_BUDGET: Duration = Duration::from_secs(120);
/// Days of daily-stats and HRV history fetched alongside the bundle
pub const HISTORY_DAYS: u32 = 28;
/// Recent activities requested for the bundle
const ACTIVITY_LIMIT: u32 = 50;

/// One day of the rolling history window
#[derive(Debug, Clone)]
pub struct DayHistory {
    pub date: NaiveDate,
    pub stats: MetricFetch,
    pub hrv: MetricFetch,
}

/// Everything fetched for one dashboard refresh, still in vendor shapes
#[derive(Debug, Clone)]
pub struct RawBundle {
    pub date: NaiveDate,
    pub profile: Value,
    pub settings: Value,
    pub activities: Option<Value>,
    pub sleep: MetricFetch,
    pub stress: MetricFetch,
    pub body_battery: MetricFetch,
    pub heart_rate: MetricFetch,
    pub hrv: MetricFetch,
    pub daily_summary: MetricFetch,
    /// Newest first; always `HISTORY_DAYS` entries, budget cut-offs included
    /// as unavailable
    pub history: Vec<DayHistory>,
}

/// Fetches complete daily bundles through the fallback orchestrator
pub struct BundleFetcher<'a> {
    client: &'a VendorClient,
    token: &'a SessionToken,
    telemetry: &'a FetchTelemetry,
    budget: Duration,
}

impl<'a> BundleFetcher<'a> {
    pub fn new(
        client: &'a VendorClient,
        token: &'a SessionToken,
        telemetry: &'a FetchTelemetry,
    ) -> Self {
        Self {
            client,
            token,
            telemetry,
            budget: DEFAULT_FETCH_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Fetch the bundle for `date` plus `history_days` of history.
    ///
    /// Profile and settings are prerequisites and their failures propagate;
    /// everything after that degrades per metric.
    pub async fn fetch_daily_bundle(
        &self,
        date: NaiveDate,
        history_days: u32,
    ) -> Result<RawBundle> {
        let deadline = Instant::now() + self.budget;

        let profile = self.client.get_profile(self.token).await?;
        let settings = self.client.get_settings(self.token).await?;
        let ids = UserIds::from_profile(&profile);
        if ids.preferred().is_none() {
            return Err(HunoError::invalid_response(
                "Profile payload carried no usable user identifier",
            ));
        }

        let activities = match self.client.get_activities(self.token, ACTIVITY_LIMIT).await {
            Ok(value) => Some(value),
            Err(HunoError::AuthExpired) => return Err(HunoError::AuthExpired),
            Err(e) => {
                warn!(error = %e, "activity list unavailable");
                None
            }
        };

        let orchestrator = Orchestrator::new(self.client, self.token, self.telemetry);
        let mut results = self
            .fetch_metrics(&orchestrator, &ids, date, &Metric::all(), deadline)
            .await?;

        let mut take = |metric: Metric| {
            results.remove(&metric).unwrap_or_else(MetricFetch::unavailable)
        };

        let bundle = RawBundle {
            date,
            profile,
            settings,
            activities,
            sleep: take(Metric::Sleep),
            stress: take(Metric::Stress),
            body_battery: take(Metric::BodyBattery),
            heart_rate: take(Metric::HeartRate),
            hrv: take(Metric::Hrv),
            daily_summary: take(Metric::DailySummary),
            history: self
                .fetch_history(&orchestrator, &ids, date, history_days, deadline)
                .await?,
        };
        Ok(bundle)
    }

    /// Run the given metrics through the orchestrator in concurrent chunks.
    /// Metrics cut off by the budget come back unavailable.
    async fn fetch_metrics(
        &self,
        orchestrator: &Orchestrator<'_>,
        ids: &UserIds,
        date: NaiveDate,
        metrics: &[Metric],
        deadline: Instant,
    ) -> Result<HashMap<Metric, MetricFetch>> {
        let mut results = HashMap::new();

        for chunk in metrics.chunks(CHUNK_SIZE) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(?date, "fetch budget exhausted, remaining metrics skipped");
                for metric in chunk {
                    results.insert(*metric, MetricFetch::unavailable());
                }
                continue;
            }

            let futures = chunk.iter().map(|metric| async move {
                let candidates = default_candidates(*metric);
                let fetch = orchestrator
                    .fetch_metric(*metric, &candidates, ids, &[date])
                    .await?;
                Ok::<(Metric, MetricFetch), HunoError>((*metric, fetch))
            });

            match tokio::time::timeout_at(deadline, join_all(futures)).await {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        let (metric, fetch) = outcome?;
                        results.insert(metric, fetch);
                    }
                }
                Err(_) => {
                    warn!(?date, "metric batch hit the fetch deadline");
                    for metric in chunk {
                        results.entry(*metric).or_insert_with(MetricFetch::unavailable);
                    }
                }
            }
        }

        Ok(results)
    }

    /// Fetch the rolling history window, newest first.
    /// Day-metric pairs run in the same concurrent chunks as the daily
    /// metrics so a slow upstream does not serialize the whole window.
    async fn fetch_history(
        &self,
        orchestrator: &Orchestrator<'_>,
        ids: &UserIds,
        date: NaiveDate,
        history_days: u32,
        deadline: Instant,
    ) -> Result<Vec<DayHistory>> {
        let days: Vec<NaiveDate> = (1..=i64::from(history_days))
            .map(|offset| date - chrono::Duration::days(offset))
            .collect();
        let tasks: Vec<(NaiveDate, Metric)> = days
            .iter()
            .flat_map(|day| [(*day, Metric::DailySummary), (*day, Metric::Hrv)])
            .collect();

        let mut results: HashMap<(NaiveDate, Metric), MetricFetch> = HashMap::new();
        for chunk in tasks.chunks(CHUNK_SIZE) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(?date, "fetch budget exhausted, remaining history skipped");
                continue;
            }

            let futures = chunk.iter().map(|(day, metric)| async move {
                let candidates = default_candidates(*metric);
                let fetch = orchestrator
                    .fetch_metric(*metric, &candidates, ids, &[*day])
                    .await?;
                Ok::<((NaiveDate, Metric), MetricFetch), HunoError>(((*day, *metric), fetch))
            });

            match tokio::time::timeout_at(deadline, join_all(futures)).await {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        let (key, fetch) = outcome?;
                        results.insert(key, fetch);
                    }
                }
                Err(_) => {
                    warn!(?date, "history batch hit the fetch deadline");
                }
            }
        }

        Ok(days
            .into_iter()
            .map(|day| DayHistory {
                date: day,
                stats: results
                    .remove(&(day, Metric::DailySummary))
                    .unwrap_or_else(MetricFetch::unavailable),
                hrv: results
                    .remove(&(day, Metric::Hrv))
                    .unwrap_or_else(MetricFetch::unavailable),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_window_constant() {
        assert_eq!(HISTORY_DAYS, 28);
    }

    #[test]
    fn test_chunking_covers_all_metrics() {
        let metrics = Metric::all();
        let chunks: Vec<_> = metrics.chunks(CHUNK_SIZE).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 5);
        assert_eq!(chunks[1].len(), 1);
    }
}
