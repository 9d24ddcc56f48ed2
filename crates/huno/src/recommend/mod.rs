//! Deterministic training recommendation engine

pub mod engine;
pub mod input;

pub use engine::{calculate_training_recommendation, calculate_with_date, TrainingPrescription};
pub use input::{
    ActivityLevel, EnergyLevel, InjuryReport, InjurySeverity, MainGoal, PhysicalTests, Priority,
    RecommendationInput, Sex, SleepQuality, StressLevel, TimeHorizon,
};
