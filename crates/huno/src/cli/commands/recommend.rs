//! Recommendation command: run the engine over questionnaire answers

use serde_json::Value;

use crate::error::Result;
use crate::recommend::{calculate_training_recommendation, RecommendationInput};

/// Execute the recommend command
pub async fn run(input_path: String) -> Result<()> {
    let raw = std::fs::read_to_string(&input_path)?;
    let answers: Value = serde_json::from_str(&raw)?;

    let input = RecommendationInput::from_answers(&answers);
    let prescription = calculate_training_recommendation(&input);

    println!("Training Recommendation");
    println!("{}", "-".repeat(40));
    println!(
        "Weekly volume:    {} min",
        prescription.target_weekly_minutes
    );
    println!(
        "Sessions/week:    {}",
        prescription.recommended_sessions_per_week
    );
    println!(
        "Session duration: {} min",
        prescription.recommended_session_duration_min
    );
    println!();
    println!("{}", serde_json::to_string_pretty(&prescription)?);

    Ok(())
}
