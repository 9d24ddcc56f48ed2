//! Canonical profile model and the raw-payload mapping into it

pub mod transform;
pub mod types;

pub use transform::{canonicalize, compute_bmi};
pub use types::{
    Activity, Availability, CardioStatus, GamificationMeta, HeartRatePoint, HistoryPoint,
    HrvSummary, MetricData, SleepSummary, StressData, TimePoint, UserIdentity, UserProfile,
    WellnessHistory, WellnessStatus,
};
