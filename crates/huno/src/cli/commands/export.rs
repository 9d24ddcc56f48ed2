//! Export command: assemble the user-facing JSON document

use serde_json::Value;

use crate::error::Result;
use crate::export::build_final_export;
use crate::recommend::{calculate_training_recommendation, RecommendationInput};

use super::fetch::{load_profile, parse_date};

/// Execute the export command
pub async fn run(
    onboarding_path: String,
    output: Option<String>,
    date: Option<String>,
    days: u32,
    no_cache: bool,
    profile: Option<String>,
) -> Result<()> {
    let raw = std::fs::read_to_string(&onboarding_path)?;
    let answers: Value = serde_json::from_str(&raw)?;

    let date = parse_date(date)?;
    let canonical = load_profile(date, days, no_cache, profile).await?;

    let input = RecommendationInput::from_answers(&answers);
    let prescription = calculate_training_recommendation(&input);

    let export = build_final_export(&canonical, &answers, &prescription);
    let document = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            std::fs::write(&path, document)?;
            println!("Export written to {}", path);
        }
        None => println!("{}", document),
    }

    Ok(())
}
