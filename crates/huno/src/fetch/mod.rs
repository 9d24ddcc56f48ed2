//! Resilient acquisition of vendor wellness data

pub mod bundle;
pub mod candidates;
pub mod orchestrator;
pub mod telemetry;

pub use bundle::{BundleFetcher, DayHistory, RawBundle, DEFAULT_FETCH_BUDGET, HISTORY_DAYS};
pub use candidates::{
    default_candidates, DateParamStyle, EndpointCandidate, Metric, RequestSpec, UserIdKind, UserIds,
};
pub use orchestrator::{MetricFetch, Orchestrator};
pub use telemetry::{FeatureSummary, FetchTelemetry};
