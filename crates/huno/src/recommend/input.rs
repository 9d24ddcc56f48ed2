//! Typed recommendation input, parsed leniently from questionnaire answers
//!
//! Onboarding answers arrive as free-form JSON from the questionnaire UI,
//! including localized values from an earlier French-only revision.
//! Unrecognized values fall back to documented defaults instead of failing
//! the whole recommendation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "male" | "homme" => Self::Male,
            "female" | "femme" => Self::Female,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    High,
}

impl ActivityLevel {
    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "sedentary" => Self::Sedentary,
            "light" => Self::Light,
            "high" => Self::High,
            _ => Self::Moderate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainGoal {
    FatLoss,
    WeightLoss,
    BodyRecomp,
    MuscleGain,
    Performance,
    Cardio,
    Health,
    Fitness,
    Energy,
}

impl MainGoal {
    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "fat_loss" => Self::FatLoss,
            "weight_loss" => Self::WeightLoss,
            "body_recomp" => Self::BodyRecomp,
            "muscle_gain" => Self::MuscleGain,
            "performance" => Self::Performance,
            "cardio" => Self::Cardio,
            "fitness" => Self::Fitness,
            "energy" => Self::Energy,
            _ => Self::Health,
        }
    }

    /// Goals whose prescriptions push toward endurance volume
    pub fn is_endurance(self) -> bool {
        matches!(self, Self::Performance | Self::Cardio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Health,
    Performance,
    Aesthetics,
    Balance,
    Speed,
    Habit,
}

impl Priority {
    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "performance" => Self::Performance,
            "aesthetics" => Self::Aesthetics,
            "balance" => Self::Balance,
            "speed" => Self::Speed,
            "habit" => Self::Habit,
            _ => Self::Health,
        }
    }
}

/// Either a named bucket or an explicit target date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeHorizon {
    OneMonth,
    ThreeMonths,
    SixMonths,
    TargetDate(NaiveDate),
    Unspecified,
}

impl TimeHorizon {
    /// Resolve to a week count. An explicit date never collapses below
    /// four weeks; unrecognized input gets the three-month default.
    pub fn weeks_to_goal(self, today: NaiveDate) -> f64 {
        match self {
            Self::OneMonth => 4.0,
            Self::ThreeMonths => 12.0,
            Self::SixMonths => 24.0,
            Self::TargetDate(target) => {
                let days = (target - today).num_days() as f64;
                (days / 7.0).max(4.0)
            }
            Self::Unspecified => 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Average,
    Good,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjurySeverity {
    Low,
    Medium,
    High,
}

/// Self-test results; a skipped test is `None` and triggers no capacity
/// classification on its own
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PhysicalTests {
    pub pushups_max: Option<u32>,
    pub squats_max: Option<u32>,
    pub plank_seconds: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InjuryReport {
    pub lower_back: bool,
    pub knee: bool,
    pub shoulder: bool,
    pub hip: bool,
    pub severity: Option<InjurySeverity>,
}

impl InjuryReport {
    /// Serious: globally severe, or two or more load-bearing regions flagged
    pub fn is_serious(&self) -> bool {
        if self.severity == Some(InjurySeverity::High) {
            return true;
        }
        let flagged = [self.lower_back, self.knee, self.shoulder, self.hip]
            .iter()
            .filter(|f| **f)
            .count();
        flagged >= 2
    }

    pub fn is_minor(&self) -> bool {
        self.severity == Some(InjurySeverity::Medium)
    }
}

/// Everything the engine needs; pure data, no I/O behind it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub sex: Sex,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub main_goal: MainGoal,
    pub secondary_goals: Vec<MainGoal>,
    pub horizon: TimeHorizon,
    pub priority: Priority,
    pub activity_level: ActivityLevel,
    pub sleep_quality: SleepQuality,
    pub stress_level: StressLevel,
    pub energy_level: EnergyLevel,
    pub tests: PhysicalTests,
    pub injuries: InjuryReport,
}

impl Default for RecommendationInput {
    fn default() -> Self {
        Self {
            sex: Sex::Other,
            age: 0,
            height_cm: 0.0,
            weight_kg: 0.0,
            main_goal: MainGoal::Health,
            secondary_goals: Vec::new(),
            horizon: TimeHorizon::Unspecified,
            priority: Priority::Health,
            activity_level: ActivityLevel::Moderate,
            sleep_quality: SleepQuality::Average,
            stress_level: StressLevel::Medium,
            energy_level: EnergyLevel::Medium,
            tests: PhysicalTests::default(),
            injuries: InjuryReport::default(),
        }
    }
}

fn str_at<'a>(answers: &'a Value, key: &str) -> Option<&'a str> {
    answers.get(key).and_then(Value::as_str)
}

fn u32_at(answers: &Value, key: &str) -> Option<u32> {
    answers
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn f64_at(answers: &Value, key: &str) -> Option<f64> {
    answers.get(key).and_then(Value::as_f64)
}

fn bool_at(answers: &Value, key: &str) -> bool {
    answers.get(key).and_then(Value::as_bool).unwrap_or(false)
}

impl RecommendationInput {
    /// Build an input from raw questionnaire answers.
    ///
    /// Every field is optional in the payload; anything missing or
    /// unrecognized takes the engine default rather than erroring.
    pub fn from_answers(answers: &Value) -> Self {
        let defaults = Self::default();

        let horizon = match str_at(answers, "goal_timeline") {
            Some("1m") => TimeHorizon::OneMonth,
            Some("3m") => TimeHorizon::ThreeMonths,
            Some("6m") => TimeHorizon::SixMonths,
            Some("custom") => str_at(answers, "custom_date_value")
                .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
                .map(TimeHorizon::TargetDate)
                .unwrap_or(TimeHorizon::Unspecified),
            _ => TimeHorizon::Unspecified,
        };

        let injuries = answers
            .get("injuries")
            .map(|report| InjuryReport {
                lower_back: bool_at(report, "lower_back"),
                knee: bool_at(report, "knee"),
                shoulder: bool_at(report, "shoulder"),
                hip: bool_at(report, "hip"),
                severity: str_at(report, "severity").map(|raw| match raw {
                    "high" => InjurySeverity::High,
                    "medium" => InjurySeverity::Medium,
                    _ => InjurySeverity::Low,
                }),
            })
            .unwrap_or_default();

        Self {
            sex: str_at(answers, "sex").map(Sex::parse).unwrap_or(defaults.sex),
            age: u32_at(answers, "age").unwrap_or(defaults.age),
            height_cm: f64_at(answers, "height_cm").unwrap_or(defaults.height_cm),
            weight_kg: f64_at(answers, "weight_kg").unwrap_or(defaults.weight_kg),
            main_goal: str_at(answers, "main_goal")
                .map(MainGoal::parse)
                .unwrap_or(defaults.main_goal),
            secondary_goals: answers
                .get("secondary_goals")
                .and_then(Value::as_array)
                .map(|goals| {
                    goals
                        .iter()
                        .filter_map(Value::as_str)
                        .map(MainGoal::parse)
                        .collect()
                })
                .unwrap_or_default(),
            horizon,
            priority: str_at(answers, "priority")
                .map(Priority::parse)
                .unwrap_or(defaults.priority),
            activity_level: str_at(answers, "activity_level")
                .map(ActivityLevel::parse)
                .unwrap_or(defaults.activity_level),
            sleep_quality: match str_at(answers, "sleep_quality") {
                Some("poor") => SleepQuality::Poor,
                Some("good") => SleepQuality::Good,
                _ => SleepQuality::Average,
            },
            stress_level: match str_at(answers, "stress_level") {
                Some("low") => StressLevel::Low,
                Some("high") => StressLevel::High,
                _ => StressLevel::Medium,
            },
            energy_level: match str_at(answers, "energy_level") {
                Some("low") => EnergyLevel::Low,
                Some("high") => EnergyLevel::High,
                _ => EnergyLevel::Medium,
            },
            tests: PhysicalTests {
                pushups_max: u32_at(answers, "pushups_count"),
                squats_max: u32_at(answers, "squats_count"),
                plank_seconds: u32_at(answers, "plank_seconds"),
            },
            injuries,
        }
    }
}
