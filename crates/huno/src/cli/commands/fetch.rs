//! Dashboard fetch command: pull, canonicalize and cache one day of data

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::cache::CacheStore;
use crate::canonical::{canonicalize, UserProfile};
use crate::config::Settings;
use crate::error::{HunoError, Result};
use crate::fetch::{BundleFetcher, FetchTelemetry};

use super::auth::authenticated_client;

/// Execute the fetch command
pub async fn run(
    date: Option<String>,
    days: u32,
    no_cache: bool,
    profile: Option<String>,
) -> Result<()> {
    let date = parse_date(date)?;
    let canonical = load_profile(date, days, no_cache, profile).await?;
    println!("{}", serde_json::to_string_pretty(&canonical)?);
    Ok(())
}

/// Resolve the canonical profile for a date, consulting the cache first.
/// Shared with the export command.
pub(crate) async fn load_profile(
    date: NaiveDate,
    days: u32,
    no_cache: bool,
    profile: Option<String>,
) -> Result<UserProfile> {
    let settings = Settings::from_env();
    let (client, token) = authenticated_client(profile).await?;

    let cache = CacheStore::new()?;
    let user_key = token.display_name.clone().unwrap_or_else(|| "default".to_string());
    let date_key = date.format("%Y-%m-%d").to_string();
    let use_cache = !no_cache && !settings.debug;

    if use_cache {
        if let Some(cached) = cache.get(&user_key, &date_key) {
            if let Ok(canonical) = serde_json::from_value::<UserProfile>(cached) {
                info!(date = %date_key, "serving profile from cache");
                return Ok(canonical);
            }
        }
    }

    let telemetry = FetchTelemetry::new();
    let fetcher = BundleFetcher::new(&client, &token, &telemetry);
    let bundle = fetcher.fetch_daily_bundle(date, days).await?;
    let canonical = canonicalize(&bundle);

    for (feature, summary) in telemetry.summary() {
        info!(
            feature = %feature,
            ok = summary.success_count,
            failed = summary.error_count,
            last_status = summary.last_status,
            p95_ms = summary.p95_latency_ms(),
            "fetch summary"
        );
    }

    if use_cache {
        cache.put(&user_key, &date_key, serde_json::to_value(&canonical)?)?;
    }

    Ok(canonical)
}

pub(crate) fn parse_date(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| HunoError::InvalidDateFormat(raw)),
        None => Ok(Utc::now().date_naive()),
    }
}
