//! Authentication commands for huno

use std::io::{self, Write};

use crate::client::{ClientConfig, SessionToken, VendorClient};
use crate::config::{SessionStore, Settings};
use crate::error::{HunoError, Result};

const DEFAULT_DOMAIN: &str = "garmin.com";

/// Execute the login command
pub async fn login(email: Option<String>, profile: Option<String>) -> Result<()> {
    let store = SessionStore::new(profile)?;

    if store.has_session() {
        if let Some(token) = store.load()? {
            if !token.is_expired() {
                println!("Already logged in. Use 'huno auth logout' to log out first.");
                return Ok(());
            }
        }
    }

    let email = match email {
        Some(e) => e,
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    let password = prompt_password("Password: ")?;

    println!("Logging in...");

    let client = VendorClient::new(&ClientConfig::for_domain(
        DEFAULT_DOMAIN,
        &Settings::from_env(),
    ))?;
    let token = client.login(&email, &password).await?;
    store.save(&token)?;

    println!("Successfully logged in!");
    println!("Profile: {}", store.profile());

    Ok(())
}

/// Execute the logout command
pub async fn logout(profile: Option<String>) -> Result<()> {
    let store = SessionStore::new(profile)?;

    if !store.has_session() {
        println!("Not logged in.");
        return Ok(());
    }

    store.clear()?;
    println!("Successfully logged out.");
    Ok(())
}

/// Execute the status command
pub async fn status(profile: Option<String>) -> Result<()> {
    let store = SessionStore::new(profile)?;

    if !store.has_session() {
        println!("Status: Not logged in");
        println!("Run 'huno auth login' to authenticate.");
        return Ok(());
    }

    match store.load()? {
        Some(token) => {
            println!("Status: Logged in");
            println!("Profile: {}", store.profile());
            if let Some(display_name) = &token.display_name {
                println!("User: {}", display_name);
            }

            if token.is_expired() {
                println!("Session: Expired (run 'huno auth login' to renew)");
            } else {
                let expires_in = token.expires_at - chrono::Utc::now().timestamp();
                if expires_in > 3600 {
                    println!("Session: Valid (expires in {} hours)", expires_in / 3600);
                } else if expires_in > 60 {
                    println!("Session: Valid (expires in {} minutes)", expires_in / 60);
                } else {
                    println!("Session: Valid (expires in {} seconds)", expires_in);
                }
            }
        }
        None => {
            println!("Status: Session file corrupted");
            println!("Run 'huno auth logout' then 'huno auth login' to fix.");
        }
    }

    Ok(())
}

/// Load a live session and build the API client other commands use
pub async fn authenticated_client(profile: Option<String>) -> Result<(VendorClient, SessionToken)> {
    let store = SessionStore::new(profile)?;
    let token = store.load()?.ok_or(HunoError::NotAuthenticated)?;
    if token.is_expired() {
        return Err(HunoError::AuthExpired);
    }
    let client = VendorClient::new(&ClientConfig::for_domain(
        DEFAULT_DOMAIN,
        &Settings::from_env(),
    ))?;
    Ok((client, token))
}

/// Prompt for a password without echoing
fn prompt_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    rpassword::read_password()
        .map_err(|e| HunoError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))
}
