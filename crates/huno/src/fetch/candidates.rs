//! Declarative endpoint fallback chains
//!
//! The vendor has no stable contract: endpoint paths, user-identifier
//! conventions and date parameter names have all changed across revisions.
//! Each metric carries an ordered list of candidates so that adding a new
//! fallback is a data change, not a code change.

use chrono::NaiveDate;
use serde_json::Value;

/// Logical wellness metric fetched from the vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Sleep,
    Stress,
    BodyBattery,
    HeartRate,
    Hrv,
    DailySummary,
}

impl Metric {
    /// Feature name used in telemetry and logs
    pub fn feature_name(self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Stress => "stress",
            Self::BodyBattery => "body_battery",
            Self::HeartRate => "heart_rate",
            Self::Hrv => "hrv",
            Self::DailySummary => "daily_summary",
        }
    }

    /// All daily metrics, in fetch order
    pub fn all() -> [Metric; 6] {
        [
            Self::Sleep,
            Self::Stress,
            Self::BodyBattery,
            Self::HeartRate,
            Self::Hrv,
            Self::DailySummary,
        ]
    }
}

/// Which user identifier a candidate interpolates into its path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIdKind {
    /// Opaque display identifier; preferred, since numeric ids are rejected
    /// by newer endpoint revisions
    DisplayName,
    /// Numeric profile id; kept as fallback, the reverse has also been seen
    ProfileId,
    /// Endpoint takes no user identifier
    None,
}

/// How a candidate passes the date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParamStyle {
    /// `?{key}=YYYY-MM-DD`
    Query(&'static str),
    /// `/{date}` path segment
    PathSuffix,
    /// `/{date}/{date}` path range
    PathRange,
    /// `?startDate=...&endDate=...` single-day range
    QueryRange,
}

/// One endpoint variant in a metric's fallback chain
#[derive(Debug, Clone)]
pub struct EndpointCandidate {
    /// Path with an optional `{userId}` placeholder
    pub path_template: &'static str,
    pub user_id: UserIdKind,
    pub date_param: DateParamStyle,
    /// Fixed extra query parameters some variants require
    pub extra_query: &'static [(&'static str, &'static str)],
}

/// User identifiers extracted from the profile payload
#[derive(Debug, Clone, Default)]
pub struct UserIds {
    pub display_name: Option<String>,
    pub profile_id: Option<i64>,
}

impl UserIds {
    /// Extract identifiers from a social-profile payload
    pub fn from_profile(profile: &Value) -> Self {
        let display_name = profile
            .get("displayName")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let profile_id = profile
            .get("profileId")
            .and_then(|v| v.as_i64())
            .or_else(|| profile.get("userProfilePK").and_then(|v| v.as_i64()))
            .or_else(|| profile.get("id").and_then(|v| v.as_i64()));

        Self {
            display_name,
            profile_id,
        }
    }

    /// The identifier preferred for downstream endpoint construction
    pub fn preferred(&self) -> Option<String> {
        self.display_name
            .clone()
            .or_else(|| self.profile_id.map(|id| id.to_string()))
    }
}

/// Concrete request produced by a candidate for one date
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl EndpointCandidate {
    /// Build the request for the given identifiers and date.
    /// Returns `None` when the required identifier is not available.
    pub fn request(&self, ids: &UserIds, date: NaiveDate) -> Option<RequestSpec> {
        let date_str = date.format("%Y-%m-%d").to_string();

        let mut path = self.path_template.to_string();
        if path.contains("{userId}") {
            let id = match self.user_id {
                UserIdKind::DisplayName => ids.display_name.clone()?,
                UserIdKind::ProfileId => ids.profile_id.map(|id| id.to_string())?,
                UserIdKind::None => return None,
            };
            path = path.replace("{userId}", &id);
        }

        let mut query: Vec<(String, String)> = Vec::new();
        match self.date_param {
            DateParamStyle::Query(key) => query.push((key.to_string(), date_str)),
            DateParamStyle::PathSuffix => path.push_str(&format!("/{}", date_str)),
            DateParamStyle::PathRange => path.push_str(&format!("/{}/{}", date_str, date_str)),
            DateParamStyle::QueryRange => {
                query.push(("startDate".to_string(), date_str.clone()));
                query.push(("endDate".to_string(), date_str));
            }
        }

        for (k, v) in self.extra_query {
            query.push(((*k).to_string(), (*v).to_string()));
        }

        Some(RequestSpec { path, query })
    }
}

/// The authoritative fallback ordering per metric.
///
/// Display-name variants come before numeric-id variants, and the most
/// specific endpoint comes first. Superseded host variants observed during
/// endpoint-drift investigations are intentionally not carried.
pub fn default_candidates(metric: Metric) -> Vec<EndpointCandidate> {
    match metric {
        Metric::Sleep => vec![
            EndpointCandidate {
                path_template: "/wellness-service/wellness/dailySleepData/{userId}",
                user_id: UserIdKind::DisplayName,
                date_param: DateParamStyle::Query("date"),
                extra_query: &[("nonSleepBufferMinutes", "60")],
            },
            EndpointCandidate {
                path_template: "/wellness-service/wellness/dailySleepData/{userId}",
                user_id: UserIdKind::ProfileId,
                date_param: DateParamStyle::Query("date"),
                extra_query: &[("nonSleepBufferMinutes", "60")],
            },
        ],
        Metric::Stress => vec![
            EndpointCandidate {
                path_template: "/wellness-service/wellness/dailyStress",
                user_id: UserIdKind::None,
                date_param: DateParamStyle::PathSuffix,
                extra_query: &[],
            },
            EndpointCandidate {
                path_template: "/wellness-service/wellness/dailyStress/{userId}",
                user_id: UserIdKind::DisplayName,
                date_param: DateParamStyle::Query("date"),
                extra_query: &[],
            },
        ],
        Metric::BodyBattery => vec![
            EndpointCandidate {
                path_template: "/wellness-service/wellness/bodyBattery/reports/daily",
                user_id: UserIdKind::None,
                date_param: DateParamStyle::QueryRange,
                extra_query: &[],
            },
            EndpointCandidate {
                path_template: "/wellness-service/wellness/dailyBodyBattery",
                user_id: UserIdKind::None,
                date_param: DateParamStyle::PathRange,
                extra_query: &[],
            },
        ],
        Metric::HeartRate => vec![
            EndpointCandidate {
                path_template: "/wellness-service/wellness/dailyHeartRate/{userId}",
                user_id: UserIdKind::DisplayName,
                date_param: DateParamStyle::Query("date"),
                extra_query: &[],
            },
            EndpointCandidate {
                path_template: "/wellness-service/wellness/dailyHeartRate/{userId}",
                user_id: UserIdKind::ProfileId,
                date_param: DateParamStyle::Query("date"),
                extra_query: &[],
            },
        ],
        Metric::Hrv => vec![
            EndpointCandidate {
                path_template: "/hrv-service/hrv",
                user_id: UserIdKind::None,
                date_param: DateParamStyle::PathSuffix,
                extra_query: &[],
            },
            EndpointCandidate {
                path_template: "/hrv-service/hrv/daily",
                user_id: UserIdKind::None,
                date_param: DateParamStyle::PathRange,
                extra_query: &[],
            },
        ],
        Metric::DailySummary => vec![
            EndpointCandidate {
                path_template: "/usersummary-service/usersummary/daily/{userId}",
                user_id: UserIdKind::DisplayName,
                date_param: DateParamStyle::Query("calendarDate"),
                extra_query: &[],
            },
            EndpointCandidate {
                path_template: "/usersummary-service/usersummary/daily/{userId}",
                user_id: UserIdKind::ProfileId,
                date_param: DateParamStyle::Query("date"),
                extra_query: &[],
            },
        ],
    }
}
