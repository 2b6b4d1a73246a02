use std::time::Duration;

use anyhow::{Context, Result};

use crate::decision::critical::DEFAULT_CRITICAL_KEYWORDS;

const DEFAULT_RATER_TIMEOUT_SECS: u64 = 180;
const DEFAULT_NEGOTIATION_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Sessions are kept in memory when unset.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub rater_timeout: Duration,
    pub negotiation_timeout: Duration,
    pub critical_flag_keywords: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            rater_timeout: parse_secs(
                "RATER_TIMEOUT_SECS",
                optional_env("RATER_TIMEOUT_SECS"),
                DEFAULT_RATER_TIMEOUT_SECS,
            )?,
            negotiation_timeout: parse_secs(
                "NEGOTIATION_TIMEOUT_SECS",
                optional_env("NEGOTIATION_TIMEOUT_SECS"),
                DEFAULT_NEGOTIATION_TIMEOUT_SECS,
            )?,
            critical_flag_keywords: parse_keywords(optional_env("CRITICAL_FLAG_KEYWORDS")),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_secs(key: &str, raw: Option<String>, default: u64) -> Result<Duration> {
    let secs = match raw {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(Duration::from_secs(secs))
}

/// Comma-separated list; falls back to the built-in stems when unset or empty.
fn parse_keywords(raw: Option<String>) -> Vec<String> {
    let keywords: Vec<String> = raw
        .iter()
        .flat_map(|v| v.split(','))
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        DEFAULT_CRITICAL_KEYWORDS.iter().map(|k| k.to_string()).collect()
    } else {
        keywords
    }
}
