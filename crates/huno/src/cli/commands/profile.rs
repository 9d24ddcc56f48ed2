//! Profile commands for huno

use crate::error::Result;

use super::auth::authenticated_client;

/// Show user profile
pub async fn show(profile: Option<String>) -> Result<()> {
    let (client, token) = authenticated_client(profile).await?;
    let social = client.get_profile(&token).await?;

    println!("User Profile");
    println!("{}", "-".repeat(40));

    if let Some(name) = social.get("displayName").and_then(|v| v.as_str()) {
        println!("Display Name: {}", name);
    }

    if let Some(name) = social.get("fullName").and_then(|v| v.as_str()) {
        println!("Full Name:    {}", name);
    }

    if let Some(location) = social.get("location").and_then(|v| v.as_str()) {
        if !location.is_empty() {
            println!("Location:     {}", location);
        }
    }

    if let Some(id) = social.get("profileId").and_then(|v| v.as_i64()) {
        println!("Profile ID:   {}", id);
    }

    if let Some(level) = social.get("userLevel").and_then(|v| v.as_i64()) {
        println!("Level:        {}", level);
    }

    Ok(())
}

/// Show user settings
pub async fn settings(profile: Option<String>) -> Result<()> {
    let (client, token) = authenticated_client(profile).await?;
    let settings = client.get_settings(&token).await?;
    let user_data = settings.get("userData").unwrap_or(&settings);

    println!("User Settings");
    println!("{}", "-".repeat(40));

    if let Some(height) = user_data.get("height").and_then(|v| v.as_f64()) {
        println!("Height:       {:.0} cm", height);
    }

    if let Some(weight) = user_data.get("weight").and_then(|v| v.as_f64()) {
        println!("Weight:       {:.1} kg", weight / 1000.0);
    }

    if let Some(gender) = user_data.get("gender").and_then(|v| v.as_str()) {
        println!("Gender:       {}", gender);
    }

    if let Some(dob) = user_data.get("birthDate").and_then(|v| v.as_str()) {
        println!("Birth Date:   {}", dob);
    }

    if let Some(vo2max) = user_data.get("vo2Max").and_then(|v| v.as_f64()) {
        println!("VO2 Max:      {:.1}", vo2max);
    }

    Ok(())
}
