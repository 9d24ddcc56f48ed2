//! Raw bundle → canonical profile mapping
//!
//! Pure, total function over whatever the fetch layer managed to collect.
//! Unknown shapes degrade to `None` with a log line for endpoint-drift
//! investigation; nothing in here throws.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::debug;

use crate::canonical::types::{
    Activity, Availability, CardioStatus, GamificationMeta, HeartRatePoint, HistoryPoint,
    HrvSummary, MetricData, SleepSummary, StressData, TimePoint, UserIdentity, UserProfile,
    WellnessHistory, WellnessStatus,
};
use crate::fetch::orchestrator::MetricFetch;
use crate::fetch::RawBundle;

/// Build the canonical profile from a (possibly partial) raw bundle
pub fn canonicalize(bundle: &RawBundle) -> UserProfile {
    UserProfile {
        date: bundle.date,
        identity: identity(&bundle.profile, &bundle.settings, bundle.date),
        devices: devices(&bundle.profile),
        gamification: gamification(&bundle.profile),
        cardio: cardio(&bundle.heart_rate, &bundle.settings),
        wellness: WellnessStatus {
            sleep: sleep(&bundle.sleep),
            stress: stress(&bundle.stress),
            body_battery: body_battery(&bundle.body_battery),
            hrv: hrv(&bundle.hrv),
            history: history(bundle),
        },
        activities: activities(bundle.activities.as_ref()),
    }
}

fn f64_at(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn i64_at(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

fn str_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// BMI from kilograms and centimeters, 2 decimals. Null-safe: missing or
/// zero inputs yield `None`, never a division by zero.
pub fn compute_bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let weight = weight_kg.filter(|w| *w > 0.0)?;
    let height_m = height_cm.filter(|h| *h > 0.0)? / 100.0;
    Some((weight / (height_m * height_m) * 100.0).round() / 100.0)
}

/// Explicit age when present, otherwise derived from birth date
fn resolve_age(user_data: &Value, today: NaiveDate) -> Option<u32> {
    if let Some(age) = i64_at(user_data, "age") {
        return u32::try_from(age).ok();
    }
    let birth = str_at(user_data, "birthDate")?;
    let birth = NaiveDate::parse_from_str(&birth, "%Y-%m-%d").ok()?;
    let days = (today - birth).num_days();
    if days < 0 {
        return None;
    }
    Some((days as f64 / 365.25).floor() as u32)
}

fn identity(profile: &Value, settings: &Value, today: NaiveDate) -> UserIdentity {
    let user_data = settings.get("userData").unwrap_or(&Value::Null);

    // Upstream weight is grams
    let weight_kg = f64_at(user_data, "weight").map(|grams| grams / 1000.0);
    let height_cm = f64_at(user_data, "height");

    UserIdentity {
        full_name: str_at(profile, "fullName"),
        display_name: str_at(profile, "displayName"),
        location: str_at(profile, "location"),
        sex: str_at(user_data, "gender"),
        age: resolve_age(user_data, today),
        height_cm,
        weight_kg,
        bmi: compute_bmi(weight_kg, height_cm),
    }
}

fn devices(profile: &Value) -> Vec<String> {
    profile
        .get("devices")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .or_else(|| str_at(item, "displayName"))
                        .or_else(|| str_at(item, "productDisplayName"))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn gamification(profile: &Value) -> GamificationMeta {
    GamificationMeta {
        level: i64_at(profile, "userLevel"),
        points: i64_at(profile, "userPoint"),
    }
}

fn cardio(heart_rate: &MetricFetch, settings: &Value) -> CardioStatus {
    let vo2max = settings
        .get("userData")
        .and_then(|d| d.get("vo2Max"))
        .and_then(Value::as_f64);

    let Some(data) = heart_rate.data.as_ref() else {
        return CardioStatus {
            vo2max,
            ..CardioStatus::default()
        };
    };

    let mut series: Vec<HeartRatePoint> = data
        .get("heartRateValues")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|entry| {
                    let tuple = entry.as_array()?;
                    Some(HeartRatePoint {
                        timestamp: tuple.first()?.as_i64()?,
                        bpm: tuple.get(1).and_then(Value::as_i64),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    series.sort_by_key(|point| point.timestamp);

    CardioStatus {
        vo2max,
        resting_hr: i64_at(data, "restingHeartRate"),
        hr_min: i64_at(data, "minHeartRate"),
        hr_max: i64_at(data, "maxHeartRate"),
        hr_7day_avg_rest: i64_at(data, "lastSevenDaysAvgRestingHeartRate"),
        series,
    }
}

/// Fold the fetch availability into a metric whose payload shape did not
/// resolve to data
fn degraded<T>(fetch: &MetricFetch) -> MetricData<T> {
    match fetch.availability {
        Availability::Error => MetricData::error(),
        _ => MetricData::unavailable(),
    }
}

fn sleep(fetch: &MetricFetch) -> MetricData<SleepSummary> {
    let Some(data) = fetch.data.as_ref() else {
        return degraded(fetch);
    };

    // Nested DTO on newer revisions, flat daily summary on older ones
    let dto = data.get("dailySleepDTO").unwrap_or(data);
    let total = i64_at(dto, "sleepTimeSeconds").or_else(|| i64_at(dto, "sleepingSeconds"));

    match total {
        Some(total_seconds) if total_seconds > 0 => MetricData::available(SleepSummary {
            total_seconds,
            deep_seconds: i64_at(dto, "deepSleepSeconds"),
            light_seconds: i64_at(dto, "lightSleepSeconds"),
            rem_seconds: i64_at(dto, "remSleepSeconds"),
            awake_seconds: i64_at(dto, "awakeSleepSeconds"),
        }),
        _ => {
            debug!("sleep payload present but carried no positive total");
            degraded(fetch)
        }
    }
}

fn stress(fetch: &MetricFetch) -> MetricData<StressData> {
    let Some(data) = fetch.data.as_ref() else {
        return degraded(fetch);
    };

    if let Some(values) = data.get("stressValuesArray").and_then(Value::as_array) {
        // Negative levels are the vendor's "no reading" sentinel
        let points: Vec<TimePoint> = values
            .iter()
            .filter_map(|entry| {
                let tuple = entry.as_array()?;
                let level = tuple.get(1)?.as_f64()?;
                if level < 0.0 {
                    return None;
                }
                Some(TimePoint {
                    timestamp: tuple.first()?.as_i64()?,
                    value: level,
                })
            })
            .collect();
        if !points.is_empty() {
            return MetricData::available(StressData::Series(points));
        }
    }

    let average = f64_at(data, "avgStressLevel").or_else(|| f64_at(data, "averageStressLevel"));
    let max = f64_at(data, "maxStressLevel");
    if average.is_some() || max.is_some() {
        return MetricData::available(StressData::Summary {
            average,
            max,
            duration_seconds: i64_at(data, "stressDuration"),
            qualifier: str_at(data, "stressQualifier"),
        });
    }

    debug!("stress payload matched no known shape");
    degraded(fetch)
}

/// Map `[timestamp, statusCode, level, ...]` tuples (or the older
/// `[timestamp, level]` pairs) into time points
fn battery_tuple_points(values: &[Value]) -> Vec<TimePoint> {
    values
        .iter()
        .filter_map(|entry| {
            let tuple = entry.as_array()?;
            let value = match tuple.len() {
                n if n >= 3 => tuple.get(2)?.as_f64()?,
                2 => tuple.get(1)?.as_f64()?,
                _ => return None,
            };
            Some(TimePoint {
                timestamp: tuple.first()?.as_i64()?,
                value,
            })
        })
        .collect()
}

fn body_battery(fetch: &MetricFetch) -> MetricData<Vec<TimePoint>> {
    let Some(data) = fetch.data.as_ref() else {
        return degraded(fetch);
    };

    // The reports endpoint returns an array of per-day records
    let record = match data {
        Value::Array(items) => items.first().unwrap_or(data),
        _ => data,
    };

    if let Some(values) = record
        .get("bodyBatteryValuesArray")
        .and_then(Value::as_array)
    {
        let points = battery_tuple_points(values);
        if !points.is_empty() {
            return MetricData::available(points);
        }
    }

    // Scalar fallback: synthesize a single point at the current instant
    let scalar = f64_at(record, "bodyBatteryMostRecentValue")
        .or_else(|| f64_at(record, "mostRecentValue"))
        .or_else(|| f64_at(record, "charged"))
        .or_else(|| f64_at(record, "chargedValue"));
    if let Some(level) = scalar {
        return MetricData::available(vec![TimePoint {
            timestamp: Utc::now().timestamp_millis(),
            value: level,
        }]);
    }

    debug!("body battery payload matched no known shape");
    degraded(fetch)
}

fn hrv(fetch: &MetricFetch) -> MetricData<HrvSummary> {
    let Some(data) = fetch.data.as_ref() else {
        return degraded(fetch);
    };

    let summary = data.get("hrvSummary").unwrap_or(data);
    let parsed = HrvSummary {
        weekly_avg: f64_at(summary, "weeklyAvg"),
        last_night_avg: f64_at(summary, "lastNightAvg"),
        last_night_high: f64_at(summary, "lastNight5MinHigh"),
        status: str_at(summary, "status"),
    };

    if parsed.weekly_avg.is_none() && parsed.last_night_avg.is_none() {
        debug!("hrv payload matched no known shape");
        return degraded(fetch);
    }
    MetricData::available(parsed)
}

/// Assemble rolling history sequences, oldest first. Days the budget cut
/// off appear with a null value rather than being dropped.
fn history(bundle: &RawBundle) -> WellnessHistory {
    let mut hrv_points = Vec::with_capacity(bundle.history.len());
    let mut stress_points = Vec::with_capacity(bundle.history.len());
    let mut battery_points = Vec::with_capacity(bundle.history.len());

    // Bundle history is newest first
    for day in bundle.history.iter().rev() {
        let hrv_value = day.hrv.data.as_ref().and_then(|data| {
            let summary = data.get("hrvSummary").unwrap_or(data);
            f64_at(summary, "lastNightAvg")
        });
        let stress_value = day.stats.data.as_ref().and_then(|stats| {
            f64_at(stats, "averageStressLevel").or_else(|| f64_at(stats, "avgStressLevel"))
        });
        let battery_value = day.stats.data.as_ref().and_then(|stats| {
            f64_at(stats, "bodyBatteryHighestValue")
                .or_else(|| f64_at(stats, "bodyBatteryMostRecentValue"))
        });

        hrv_points.push(HistoryPoint {
            date: day.date,
            value: hrv_value,
        });
        stress_points.push(HistoryPoint {
            date: day.date,
            value: stress_value,
        });
        battery_points.push(HistoryPoint {
            date: day.date,
            value: battery_value,
        });
    }

    WellnessHistory {
        hrv: hrv_points,
        stress: stress_points,
        body_battery: battery_points,
    }
}

fn activities(raw: Option<&Value>) -> Vec<Activity> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let items = match raw {
        Value::Array(items) => items.as_slice(),
        other => match other.get("activities").and_then(Value::as_array) {
            Some(items) => return items.iter().map(activity).collect(),
            None => {
                debug!("activity payload matched no known shape");
                return Vec::new();
            }
        },
    };
    items.iter().map(activity).collect()
}

fn activity(item: &Value) -> Activity {
    Activity {
        id: i64_at(item, "activityId"),
        name: str_at(item, "activityName"),
        sport_type: item
            .get("activityType")
            .and_then(|t| t.get("typeKey"))
            .and_then(Value::as_str)
            .map(str::to_string),
        start_time_local: str_at(item, "startTimeLocal"),
        start_time_utc: str_at(item, "startTimeGMT"),
        duration_seconds: f64_at(item, "duration"),
        distance_meters: f64_at(item, "distance"),
        calories: f64_at(item, "calories"),
        average_hr: f64_at(item, "averageHR"),
        max_hr: f64_at(item, "maxHR"),
        training_load: f64_at(item, "activityTrainingLoad"),
        max_depth: f64_at(item, "maxDepth"),
        aerobic_training_effect: f64_at(item, "aerobicTrainingEffect"),
        anaerobic_training_effect: f64_at(item, "anaerobicTrainingEffect"),
        moderate_intensity_minutes: i64_at(item, "moderateIntensityMinutes"),
        vigorous_intensity_minutes: i64_at(item, "vigorousIntensityMinutes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DayHistory;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 4).unwrap()
    }

    fn empty_bundle() -> RawBundle {
        RawBundle {
            date: date(),
            profile: json!({}),
            settings: json!({}),
            activities: None,
            sleep: MetricFetch::unavailable(),
            stress: MetricFetch::unavailable(),
            body_battery: MetricFetch::unavailable(),
            heart_rate: MetricFetch::unavailable(),
            hrv: MetricFetch::unavailable(),
            daily_summary: MetricFetch::unavailable(),
            history: Vec::new(),
        }
    }

    #[test]
    fn test_weight_converted_from_grams() {
        let mut bundle = empty_bundle();
        bundle.settings = json!({"userData": {"weight": 82500.0, "height": 180.0}});
        let profile = canonicalize(&bundle);
        assert_eq!(profile.identity.weight_kg, Some(82.5));
        assert_eq!(profile.identity.height_cm, Some(180.0));
    }

    #[test]
    fn test_bmi_rounded_two_decimals() {
        assert_eq!(compute_bmi(Some(82.5), Some(180.0)), Some(25.46));
    }

    #[test]
    fn test_bmi_null_safe() {
        assert_eq!(compute_bmi(None, Some(180.0)), None);
        assert_eq!(compute_bmi(Some(80.0), None), None);
        assert_eq!(compute_bmi(Some(80.0), Some(0.0)), None);
    }

    #[test]
    fn test_explicit_age_preferred() {
        let user_data = json!({"age": 34, "birthDate": "1990-01-01"});
        assert_eq!(resolve_age(&user_data, date()), Some(34));
    }

    #[test]
    fn test_age_derived_from_birth_date() {
        let user_data = json!({"birthDate": "1990-06-15"});
        // 2025-12-04 is 12956 days after 1990-06-15
        assert_eq!(resolve_age(&user_data, date()), Some(35));
    }

    #[test]
    fn test_partial_bundle_degrades_to_unavailable() {
        let profile = canonicalize(&empty_bundle());
        assert_eq!(profile.wellness.sleep.status, Availability::Unavailable);
        assert_eq!(profile.wellness.stress.status, Availability::Unavailable);
        assert_eq!(profile.identity.bmi, None);
        assert!(profile.activities.is_empty());
    }

    #[test]
    fn test_fetch_error_carried_through() {
        let mut bundle = empty_bundle();
        bundle.hrv = MetricFetch::error();
        let profile = canonicalize(&bundle);
        assert_eq!(profile.wellness.hrv.status, Availability::Error);
    }

    #[test]
    fn test_sleep_nested_dto() {
        let mut bundle = empty_bundle();
        bundle.sleep = MetricFetch::available(json!({
            "dailySleepDTO": {
                "sleepTimeSeconds": 27000,
                "deepSleepSeconds": 5400,
                "lightSleepSeconds": 14400,
                "remSleepSeconds": 7200
            }
        }));
        let profile = canonicalize(&bundle);
        let sleep = profile.wellness.sleep.data.unwrap();
        assert_eq!(sleep.total_seconds, 27000);
        assert_eq!(sleep.deep_seconds, Some(5400));
    }

    #[test]
    fn test_sleep_flat_without_stage_detail() {
        let mut bundle = empty_bundle();
        bundle.sleep = MetricFetch::available(json!({"sleepingSeconds": 25200}));
        let profile = canonicalize(&bundle);
        assert!(profile.wellness.sleep.is_available());
        let sleep = profile.wellness.sleep.data.unwrap();
        assert_eq!(sleep.total_seconds, 25200);
        assert_eq!(sleep.deep_seconds, None);
    }

    #[test]
    fn test_sleep_zero_total_is_unavailable() {
        let mut bundle = empty_bundle();
        bundle.sleep = MetricFetch::available(json!({"sleepingSeconds": 0}));
        let profile = canonicalize(&bundle);
        assert_eq!(profile.wellness.sleep.status, Availability::Unavailable);
    }

    #[test]
    fn test_body_battery_tuple_shape() {
        let mut bundle = empty_bundle();
        bundle.body_battery = MetricFetch::available(json!([{
            "bodyBatteryValuesArray": [
                [1733300000000i64, "MEASURED", 75, null],
                [1733300900000i64, "MEASURED", 73, null]
            ]
        }]));
        let profile = canonicalize(&bundle);
        let points = profile.wellness.body_battery.data.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 75.0);
        assert_eq!(points[0].timestamp, 1733300000000);
    }

    #[test]
    fn test_body_battery_scalar_shape() {
        let mut bundle = empty_bundle();
        bundle.body_battery =
            MetricFetch::available(json!({"bodyBatteryMostRecentValue": 58}));
        let profile = canonicalize(&bundle);
        let points = profile.wellness.body_battery.data.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 58.0);
    }

    #[test]
    fn test_stress_series_filters_sentinels() {
        let mut bundle = empty_bundle();
        bundle.stress = MetricFetch::available(json!({
            "stressValuesArray": [
                [1733300000000i64, 25],
                [1733300900000i64, -1],
                [1733301800000i64, 40]
            ]
        }));
        let profile = canonicalize(&bundle);
        match profile.wellness.stress.data.unwrap() {
            StressData::Series(points) => {
                assert_eq!(points.len(), 2);
                assert_eq!(points[1].value, 40.0);
            }
            StressData::Summary { .. } => panic!("expected series"),
        }
    }

    #[test]
    fn test_stress_summary_shape() {
        let mut bundle = empty_bundle();
        bundle.stress = MetricFetch::available(json!({
            "avgStressLevel": 31,
            "maxStressLevel": 87,
            "stressQualifier": "BALANCED"
        }));
        let profile = canonicalize(&bundle);
        match profile.wellness.stress.data.unwrap() {
            StressData::Summary { average, qualifier, .. } => {
                assert_eq!(average, Some(31.0));
                assert_eq!(qualifier.as_deref(), Some("BALANCED"));
            }
            StressData::Series(_) => panic!("expected summary"),
        }
    }

    #[test]
    fn test_heart_rate_series_sorted() {
        let mut bundle = empty_bundle();
        bundle.heart_rate = MetricFetch::available(json!({
            "restingHeartRate": 52,
            "heartRateValues": [
                [1733300900000i64, 80],
                [1733300000000i64, 62],
                [1733301800000i64, null]
            ]
        }));
        let profile = canonicalize(&bundle);
        let series = profile.cardio.series;
        assert_eq!(series.len(), 3);
        assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(series[2].bpm, None);
        assert_eq!(profile.cardio.resting_hr, Some(52));
    }

    #[test]
    fn test_history_oldest_first_with_gaps() {
        let mut bundle = empty_bundle();
        bundle.history = vec![
            DayHistory {
                date: date() - chrono::Duration::days(1),
                stats: MetricFetch::available(json!({"averageStressLevel": 28})),
                hrv: MetricFetch::available(json!({"hrvSummary": {"lastNightAvg": 44}})),
            },
            DayHistory {
                date: date() - chrono::Duration::days(2),
                stats: MetricFetch::unavailable(),
                hrv: MetricFetch::unavailable(),
            },
        ];
        let profile = canonicalize(&bundle);
        let history = profile.wellness.history;
        assert_eq!(history.hrv.len(), 2);
        // Oldest first
        assert!(history.hrv[0].date < history.hrv[1].date);
        assert_eq!(history.hrv[0].value, None);
        assert_eq!(history.hrv[1].value, Some(44.0));
        assert_eq!(history.stress[1].value, Some(28.0));
    }

    #[test]
    fn test_activities_extracted() {
        let mut bundle = empty_bundle();
        bundle.activities = Some(json!([{
            "activityId": 987654,
            "activityName": "Morning swim",
            "activityType": {"typeKey": "lap_swimming"},
            "duration": 1820.0,
            "distance": 1500.0,
            "averageHR": 132.0
        }]));
        let profile = canonicalize(&bundle);
        assert_eq!(profile.activities.len(), 1);
        assert_eq!(
            profile.activities[0].sport_type.as_deref(),
            Some("lap_swimming")
        );
        assert_eq!(profile.activities[0].distance_meters, Some(1500.0));
    }

    #[test]
    fn test_gamification_and_devices() {
        let mut bundle = empty_bundle();
        bundle.profile = json!({
            "fullName": "Test User",
            "displayName": "abc-guid",
            "location": "Lisbon",
            "userLevel": 5,
            "userPoint": 1234,
            "devices": [{"displayName": "Forerunner 955"}, "Index S2"]
        });
        let profile = canonicalize(&bundle);
        assert_eq!(profile.gamification.level, Some(5));
        assert_eq!(
            profile.devices,
            vec!["Forerunner 955".to_string(), "Index S2".to_string()]
        );
        assert_eq!(profile.identity.full_name.as_deref(), Some("Test User"));
    }
}
