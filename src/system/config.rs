use anyhow::{anyhow, bail, Context, Result};
use chrono::TimeDelta;
use std::str::FromStr;

const MAX_ACCESS_MINUTES: i64 = 60 * 24 * 365;
const MAX_REFRESH_DAYS: i64 = 365 * 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
    pub database_url: String,
    pub port: u16,
    pub bcrypt_cost: u32,
    pub log_level: String,
}

impl Config {
    /// Reads `.env` when present, then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET environment variable must be set"))?;

        Ok(Self {
            jwt_secret,
            access_ttl: window(
                &lookup,
                "JWT_ACCESS_EXPIRATION_MINUTES",
                30,
                MAX_ACCESS_MINUTES,
                TimeDelta::try_minutes,
            )?,
            refresh_ttl: window(
                &lookup,
                "JWT_REFRESH_EXPIRATION_DAYS",
                30,
                MAX_REFRESH_DAYS,
                TimeDelta::try_days,
            )?,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite::memory:".to_string()),
            port: parse_or(&lookup, "PORT", 6060)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}

/// A token lifetime in `1..=max` units.
fn window<F>(
    lookup: &F,
    key: &str,
    default: i64,
    max: i64,
    unit: fn(i64) -> Option<TimeDelta>,
) -> Result<TimeDelta>
where
    F: Fn(&str) -> Option<String>,
{
    let amount: i64 = parse_or(lookup, key, default)?;
    if !(1..=max).contains(&amount) {
        bail!("{key} must be between 1 and {max}, got {amount}");
    }
    unit(amount).ok_or_else(|| anyhow!("{key} is out of range: {amount}"))
}
