//! User-facing JSON export
//!
//! The schema below is the stable contract with downstream consumers.
//! Field names and nesting must not change without a schema_version bump.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::canonical::{UserProfile, WellnessHistory};
use crate::recommend::TrainingPrescription;

pub const SCHEMA_VERSION: &str = "1.0.0";
pub const EXPORT_SOURCE: &str = "huno_app";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub schema_version: String,
    pub generated_at: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportIdentity {
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub sex: String,
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    /// Rounded to 2 decimals
    pub weight_kg: Option<f64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportCardio {
    pub vo2max: Option<f64>,
    pub resting_hr: Option<i64>,
    pub hr_min: Option<i64>,
    pub hr_max: Option<i64>,
    pub hr_7day_avg_rest: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportWellness {
    pub sleep_available: bool,
    pub stress_available: bool,
    pub hrv_available: bool,
    pub history: WellnessHistory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSwim {
    pub date: Option<String>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub avg_hr: Option<f64>,
    pub training_load: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDive {
    pub date: Option<String>,
    pub max_depth_m: f64,
    pub bottom_time_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportActivities {
    pub swims: Vec<ExportSwim>,
    pub dives: Vec<ExportDive>,
}

/// The complete export document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalExport {
    pub metadata: ExportMetadata,
    pub identity: ExportIdentity,
    #[serde(rename = "cardioStatus")]
    pub cardio_status: ExportCardio,
    #[serde(rename = "wellnessStatus")]
    pub wellness_status: ExportWellness,
    #[serde(rename = "recentActivities")]
    pub recent_activities: ExportActivities,
    /// Questionnaire answers verbatim, plus computed recommendations
    pub onboarding: Value,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How closely the user's declared weekly volume matches the prescribed
/// target, as a 0..=100 score
fn volume_match_score(onboarding: &Value, target_weekly_minutes: u32) -> u32 {
    if target_weekly_minutes == 0 {
        return 0;
    }
    let sessions = onboarding
        .get("sessions_per_week")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let duration = onboarding
        .get("session_duration")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let declared = sessions * duration;
    let score = (declared / f64::from(target_weekly_minutes) * 100.0).round();
    (score as u32).min(100)
}

/// Merge the prescription into the onboarding answers under the
/// `algorithm_recommendations` key
fn merge_recommendations(onboarding: &Value, prescription: &TrainingPrescription) -> Value {
    let mut merged = match onboarding {
        Value::Object(map) => Value::Object(map.clone()),
        _ => json!({}),
    };
    let score = volume_match_score(onboarding, prescription.target_weekly_minutes);
    if let Some(map) = merged.as_object_mut() {
        map.insert(
            "algorithm_recommendations".to_string(),
            json!({
                "recommended_sessions_per_week": prescription.recommended_sessions_per_week,
                "recommended_session_duration_min": prescription.recommended_session_duration_min,
                "target_weekly_minutes": prescription.target_weekly_minutes,
                "volume_match_score": score,
            }),
        );
    }
    merged
}

/// Assemble the export document from a canonical profile, the raw
/// questionnaire answers, and the computed prescription
pub fn build_final_export(
    profile: &UserProfile,
    onboarding: &Value,
    prescription: &TrainingPrescription,
) -> FinalExport {
    let sex = onboarding
        .get("sex")
        .and_then(Value::as_str)
        .unwrap_or("male")
        .to_string();

    let swims = profile
        .activities
        .iter()
        .filter(|a| a.sport_type.as_deref() == Some("lap_swimming"))
        .map(|a| ExportSwim {
            date: a.start_time_local.clone(),
            distance_m: a.distance_meters.unwrap_or(0.0),
            duration_s: a.duration_seconds.unwrap_or(0.0),
            avg_hr: a.average_hr,
            training_load: a.training_load,
        })
        .collect();
    let dives = profile
        .activities
        .iter()
        .filter(|a| a.sport_type.as_deref() == Some("single_gas_diving"))
        .map(|a| ExportDive {
            date: a.start_time_local.clone(),
            max_depth_m: a.max_depth.unwrap_or(0.0),
            bottom_time_s: a.duration_seconds.unwrap_or(0.0),
        })
        .collect();

    FinalExport {
        metadata: ExportMetadata {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            source: EXPORT_SOURCE.to_string(),
        },
        identity: ExportIdentity {
            full_name: profile.identity.full_name.clone(),
            sex,
            age: profile.identity.age,
            height_cm: profile.identity.height_cm,
            weight_kg: profile.identity.weight_kg.map(round2),
            location: profile.identity.location.clone(),
        },
        cardio_status: ExportCardio {
            vo2max: profile.cardio.vo2max,
            resting_hr: profile.cardio.resting_hr,
            hr_min: profile.cardio.hr_min,
            hr_max: profile.cardio.hr_max,
            hr_7day_avg_rest: profile.cardio.hr_7day_avg_rest,
        },
        wellness_status: ExportWellness {
            sleep_available: profile.wellness.sleep.is_available(),
            stress_available: profile.wellness.stress.is_available(),
            hrv_available: profile.wellness.hrv.is_available(),
            history: profile.wellness.history.clone(),
        },
        recent_activities: ExportActivities { swims, dives },
        onboarding: merge_recommendations(onboarding, prescription),
    }
}
