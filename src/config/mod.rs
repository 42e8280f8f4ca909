//! Runtime settings read from the environment (and `.env`).
//!
//! Every variable is optional. Empty values count as unset so a blank line
//! in `.env` doesn't shadow a default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::blade::SliceOptions;
use crate::consts::{
    DEFAULT_KIE_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, DEFAULT_PREFIX,
    default_db_path,
};

pub const ENV_KIE_API_KEY: &str = "KIE_API_KEY";
pub const ENV_KIE_BASE_URL: &str = "KIE_BASE_URL";
pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_DISCORD_GUILD_ID: &str = "DISCORD_GUILD_ID";
pub const ENV_PREFIX: &str = "SORAGIRI_PREFIX";
pub const ENV_MAX_ATTEMPTS: &str = "SORAGIRI_MAX_ATTEMPTS";
pub const ENV_POLL_INTERVAL: &str = "SORAGIRI_POLL_INTERVAL_SECS";
pub const ENV_DB: &str = "SORAGIRI_DB";

#[derive(Debug, Clone)]
pub struct Settings {
    pub kie_api_key: Option<String>,
    pub kie_base_url: String,
    pub discord_token: Option<String>,
    /// Register slash commands on this guild only (instant propagation).
    pub discord_guild_id: Option<u64>,
    pub prefix: String,
    pub max_attempts: u32,
    pub poll_interval: Duration,
    /// `None` disables the history log.
    pub db_path: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let discord_guild_id = get(ENV_DISCORD_GUILD_ID)
            .map(|v| v.parse::<u64>())
            .transpose()
            .with_context(|| format!("{ENV_DISCORD_GUILD_ID} must be a numeric id"))?;

        let max_attempts = get(ENV_MAX_ATTEMPTS)
            .map(|v| v.parse::<u32>())
            .transpose()
            .with_context(|| format!("{ENV_MAX_ATTEMPTS} must be a non-negative integer"))?
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        let poll_interval = get(ENV_POLL_INTERVAL)
            .map(|v| parse_seconds(&v))
            .transpose()
            .with_context(|| format!("{ENV_POLL_INTERVAL} must be a number of seconds"))?
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Ok(Self {
            kie_api_key: get(ENV_KIE_API_KEY),
            kie_base_url: get(ENV_KIE_BASE_URL).unwrap_or_else(|| DEFAULT_KIE_BASE_URL.to_string()),
            discord_token: get(ENV_DISCORD_TOKEN),
            discord_guild_id,
            prefix: get(ENV_PREFIX).unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            max_attempts,
            poll_interval,
            db_path: get(ENV_DB).map(PathBuf::from).or_else(default_db_path),
        })
    }

    pub fn slice_options(&self) -> SliceOptions {
        SliceOptions {
            max_attempts: self.max_attempts,
            poll_interval: self.poll_interval,
        }
    }
}

/// Parse a non-negative, finite number of seconds (fractions allowed).
pub fn parse_seconds(s: &str) -> Result<Duration> {
    let secs: f64 = s
        .trim()
        .parse()
        .with_context(|| format!("invalid number: {s}"))?;
    Duration::try_from_secs_f64(secs).with_context(|| format!("out of range: {s}"))
}
