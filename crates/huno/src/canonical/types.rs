//! Canonical profile types
//!
//! One fixed internal representation, regardless of which upstream endpoint
//! variant actually answered. Every field the vendor may omit is optional;
//! absence is always `None`, never a panic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a metric's data made it into the profile.
///
/// `Unavailable` means the upstream had nothing for us (or we ran out of
/// candidates); `Error` is reserved for a final hard transport failure.
/// The distinction matters: absence of data is not the same as a broken
/// fetch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Error,
}

/// A metric payload tagged with its availability.
///
/// Invariant: `status == Available` if and only if `data` holds at least
/// one non-null data point. Constructors enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricData<T> {
    pub status: Availability,
    pub data: Option<T>,
}

impl<T> MetricData<T> {
    pub fn available(data: T) -> Self {
        Self {
            status: Availability::Available,
            data: Some(data),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: Availability::Unavailable,
            data: None,
        }
    }

    pub fn error() -> Self {
        Self {
            status: Availability::Error,
            data: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == Availability::Available
    }
}

/// One sampled value in a daily time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: i64,
    pub value: f64,
}

/// One heart-rate sample; bpm is null during sensor gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRatePoint {
    pub timestamp: i64,
    pub bpm: Option<i64>,
}

/// Who the user is, as far as the vendor told us
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserIdentity {
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub location: Option<String>,
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    /// Kilograms; the upstream reports grams
    pub weight_kg: Option<f64>,
    /// Derived, 2 decimals; null when height or weight is missing
    pub bmi: Option<f64>,
}

/// Vendor gamification metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamificationMeta {
    pub level: Option<i64>,
    pub points: Option<i64>,
}

/// Today's cardio picture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardioStatus {
    pub vo2max: Option<f64>,
    pub resting_hr: Option<i64>,
    pub hr_min: Option<i64>,
    pub hr_max: Option<i64>,
    pub hr_7day_avg_rest: Option<i64>,
    /// Sorted ascending by timestamp
    pub series: Vec<HeartRatePoint>,
}

/// Stress comes back from the vendor as either an intraday series or a
/// daily summary, depending on which endpoint revision answered. Consumers
/// must handle both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StressData {
    Series(Vec<TimePoint>),
    Summary {
        average: Option<f64>,
        max: Option<f64>,
        duration_seconds: Option<i64>,
        qualifier: Option<String>,
    },
}

/// Sleep stage totals in seconds; stage detail may be missing even when a
/// total is present
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SleepSummary {
    pub total_seconds: i64,
    pub deep_seconds: Option<i64>,
    pub light_seconds: Option<i64>,
    pub rem_seconds: Option<i64>,
    pub awake_seconds: Option<i64>,
}

/// Nightly HRV summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HrvSummary {
    pub weekly_avg: Option<f64>,
    pub last_night_avg: Option<f64>,
    pub last_night_high: Option<f64>,
    pub status: Option<String>,
}

/// One day in a rolling history sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Rolling history sequences, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WellnessHistory {
    pub hrv: Vec<HistoryPoint>,
    pub stress: Vec<HistoryPoint>,
    pub body_battery: Vec<HistoryPoint>,
}

/// Per-metric wellness sub-records, each tagged with availability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellnessStatus {
    pub sleep: MetricData<SleepSummary>,
    pub stress: MetricData<StressData>,
    pub body_battery: MetricData<Vec<TimePoint>>,
    pub hrv: MetricData<HrvSummary>,
    pub history: WellnessHistory,
}

/// One completed workout, as a read-only snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Activity {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub sport_type: Option<String>,
    pub start_time_local: Option<String>,
    pub start_time_utc: Option<String>,
    pub duration_seconds: Option<f64>,
    pub distance_meters: Option<f64>,
    pub calories: Option<f64>,
    pub average_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub training_load: Option<f64>,
    /// Meters; present on diving activities only
    pub max_depth: Option<f64>,
    pub aerobic_training_effect: Option<f64>,
    pub anaerobic_training_effect: Option<f64>,
    pub moderate_intensity_minutes: Option<i64>,
    pub vigorous_intensity_minutes: Option<i64>,
}

/// The canonical profile: one immutable snapshot per fetch session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub date: NaiveDate,
    pub identity: UserIdentity,
    pub devices: Vec<String>,
    pub gamification: GamificationMeta,
    pub cardio: CardioStatus,
    pub wellness: WellnessStatus,
    pub activities: Vec<Activity>,
}
