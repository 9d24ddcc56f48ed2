//! Weekly training prescription engine
//!
//! Pure function from a typed input profile to a prescription. The pipeline
//! is an ordered sequence of multiplicative adjustments over a base weekly
//! volume, with clamps at fixed stages. Multiplier values, clamp bounds and
//! application order are all load-bearing: later clamps see earlier
//! unclamped intermediates, so reordering changes results.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::recommend::input::{
    ActivityLevel, EnergyLevel, Priority, RecommendationInput, Sex, SleepQuality, StressLevel,
};

/// The engine's output: three integers a UI can render directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPrescription {
    pub target_weekly_minutes: u32,
    pub recommended_sessions_per_week: u32,
    pub recommended_session_duration_min: u32,
}

/// Compute the weekly prescription for the given profile.
///
/// Deterministic apart from the "today" used to resolve an explicit target
/// date; see `calculate_with_date` for the fixed-date form.
pub fn calculate_training_recommendation(input: &RecommendationInput) -> TrainingPrescription {
    calculate_with_date(input, Utc::now().date_naive())
}

/// Same pipeline with an explicit "today", fully deterministic
pub fn calculate_with_date(input: &RecommendationInput, today: NaiveDate) -> TrainingPrescription {
    let weeks_to_goal = input.horizon.weeks_to_goal(today);

    // Base weekly volume by primary goal
    let mut minutes = f64::from(input.main_goal.base_weekly_minutes());

    // Shorter horizons push harder, long ones ease off
    if weeks_to_goal <= 4.0 {
        minutes *= 1.2;
    } else if weeks_to_goal <= 8.0 {
        minutes *= 1.1;
    } else if weeks_to_goal >= 20.0 {
        minutes *= 0.9;
    }

    minutes *= match input.activity_level {
        ActivityLevel::Sedentary => 0.7,
        ActivityLevel::Light => 0.85,
        ActivityLevel::Moderate => 1.0,
        ActivityLevel::High => 1.15,
    };

    if input.age >= 60 {
        minutes *= 0.8;
    } else if input.age >= 45 {
        minutes *= 0.9;
    } else if input.age >= 30 {
        minutes *= 0.95;
    }

    if let Some(bmi) = raw_bmi(input.weight_kg, input.height_cm) {
        if bmi >= 30.0 {
            minutes *= 0.85;
        } else if bmi <= 18.5 {
            minutes *= 0.9;
        }
    }

    if input.sex == Sex::Female && input.priority == Priority::Performance {
        minutes *= 0.95;
    }

    let lifestyle = lifestyle_factor(input);
    let (capacity, very_low_capacity) = capacity_factor(input);
    let injury = injury_factor(input);

    minutes = (minutes * lifestyle * capacity * injury).clamp(60.0, 360.0);

    let mut sessions: u32 = match input.activity_level {
        ActivityLevel::Sedentary | ActivityLevel::Light => 3,
        ActivityLevel::Moderate => 4,
        ActivityLevel::High => 5,
    };
    if input.main_goal.is_endurance() && weeks_to_goal <= 12.0 && sessions < 6 {
        sessions += 1;
    }
    if input.injuries.is_serious() || very_low_capacity {
        sessions = sessions.min(4);
    }
    sessions = sessions.clamp(2, 6);

    // Duration divides the clamped, still-unrounded weekly volume
    let duration = (minutes / f64::from(sessions)).clamp(20.0, 90.0);
    let duration = ((duration / 5.0).round() * 5.0) as u32;

    TrainingPrescription {
        target_weekly_minutes: minutes.round() as u32,
        recommended_sessions_per_week: sessions,
        recommended_session_duration_min: duration,
    }
}

impl crate::recommend::input::MainGoal {
    pub(crate) fn base_weekly_minutes(self) -> u32 {
        use crate::recommend::input::MainGoal::*;
        match self {
            FatLoss | WeightLoss | BodyRecomp => 180,
            MuscleGain => 150,
            Performance | Cardio => 210,
            Health | Fitness | Energy => 120,
        }
    }
}

fn raw_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// Sleep, stress and energy sub-factors combined, clamped to [0.7, 1.15]
fn lifestyle_factor(input: &RecommendationInput) -> f64 {
    let sleep: f64 = match input.sleep_quality {
        SleepQuality::Poor => 0.8,
        SleepQuality::Average => 0.95,
        SleepQuality::Good => 1.05,
    };
    let stress = match input.stress_level {
        StressLevel::High => 0.85,
        StressLevel::Medium => 0.95,
        StressLevel::Low => 1.05,
    };
    let energy = match input.energy_level {
        EnergyLevel::Low => 0.9,
        EnergyLevel::Medium => 1.0,
        EnergyLevel::High => 1.05,
    };
    (sleep * stress * energy).clamp(0.7, 1.15)
}

/// Capacity factor from self-tests, clamped to [0.75, 1.2]. A skipped test
/// triggers neither threshold. Also reports the very-low classification
/// since it separately caps session frequency.
fn capacity_factor(input: &RecommendationInput) -> (f64, bool) {
    let tests = &input.tests;
    let very_low = tests.pushups_max.is_some_and(|n| n < 5)
        || tests.squats_max.is_some_and(|n| n < 10)
        || tests.plank_seconds.is_some_and(|n| n < 20);
    let good = tests.pushups_max.is_some_and(|n| n >= 20)
        || tests.squats_max.is_some_and(|n| n >= 40)
        || tests.plank_seconds.is_some_and(|n| n >= 60);

    let factor: f64 = if very_low {
        0.8
    } else if good {
        1.1
    } else {
        1.0
    };
    (factor.clamp(0.75, 1.2), very_low)
}

/// Injury factor, clamped to [0.7, 1.0]
fn injury_factor(input: &RecommendationInput) -> f64 {
    let factor: f64 = if input.injuries.is_serious() {
        0.75
    } else if input.injuries.is_minor() {
        0.9
    } else {
        1.0
    };
    factor.clamp(0.7, 1.0)
}
