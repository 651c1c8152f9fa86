//! Environment configuration.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::providers::ProviderRegistry;

/// API keys per sport with a shared default.
#[derive(Clone, Default)]
pub struct Credentials {
    default: Option<String>,
    per_sport: HashMap<u32, String>,
}

impl Credentials {
    pub fn new(default: Option<String>) -> Self {
        Self {
            default,
            per_sport: HashMap::new(),
        }
    }

    pub fn with_sport(mut self, sport_id: u32, key: impl Into<String>) -> Self {
        self.per_sport.insert(sport_id, key.into());
        self
    }

    /// Sport-specific key, else the shared default.
    pub fn for_sport(&self, sport_id: u32) -> Option<&str> {
        self.per_sport
            .get(&sport_id)
            .or(self.default.as_ref())
            .map(String::as_str)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sports: Vec<_> = self.per_sport.keys().copied().collect();
        sports.sort_unstable();
        f.debug_struct("Credentials")
            .field("default", &self.default.as_ref().map(|_| "<redacted>"))
            .field("per_sport", &sports)
            .finish()
    }
}

/// Configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    /// Freshness window for upcoming/listing data
    pub cache_ttl: Duration,
    pub cache_version: u32,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    /// Days ahead covered by date-range upcoming queries (7..=30)
    pub upcoming_window_days: u32,
    pub rate_limit_per_minute: u32,
    pub poll_interval_seconds: u64,
    pub health_port: u16,
    /// If true, refresh once and exit (no polling loop)
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Shared key: env var first, then an optional mounted secret file
        let default_key = match lookup("SPORTS_API_KEY") {
            Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
            Some(_) => return Err(anyhow!("SPORTS_API_KEY is set but empty")),
            None => match lookup("SPORTS_API_KEY_FILE") {
                Some(path) => Some(read_secret_file(&path, "sports_api_key")?),
                None => None,
            },
        };
        if let Some(key) = &default_key {
            reject_placeholder("SPORTS_API_KEY", key)?;
        }

        let mut credentials = Credentials::new(default_key);
        for provider in ProviderRegistry::standard().iter() {
            let name = provider.credential_env();
            if let Some(v) = lookup(&name) {
                let v = v.trim().to_string();
                if v.is_empty() {
                    continue;
                }
                reject_placeholder(&name, &v)?;
                credentials = credentials.with_sport(provider.sport_id, v);
            }
        }

        let upcoming_window_days: u32 = parse_or(&lookup, "UPCOMING_WINDOW_DAYS", 7);

        Ok(Self {
            credentials,
            cache_ttl: Duration::from_secs(parse_or(&lookup, "CACHE_TTL_SECONDS", 300)),
            cache_version: parse_or(&lookup, "CACHE_VERSION", 1),
            max_retries: parse_or(&lookup, "MAX_RETRIES", 3),
            retry_delay: Duration::from_millis(parse_or(&lookup, "RETRY_DELAY_MS", 1000)),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 15)),
            upcoming_window_days: upcoming_window_days.clamp(7, 30),
            rate_limit_per_minute: parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", 60),
            poll_interval_seconds: parse_or(&lookup, "POLL_INTERVAL_SECONDS", 60),
            health_port: parse_or(&lookup, "HEALTH_PORT", 8084),
            run_once: lookup("RUN_ONCE")
                .unwrap_or_else(|| "false".to_string())
                .to_lowercase()
                == "true",
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Prevent accidental use of sample/placeholder keys
fn reject_placeholder(name: &str, key: &str) -> Result<()> {
    let key_lower = key.to_lowercase();
    if key_lower.contains("change_me") || key_lower.contains("your_") || key_lower.starts_with("sample") {
        return Err(anyhow!(
            "{} appears to be a placeholder value; replace with your real key",
            name
        ));
    }
    Ok(())
}

/// Read a secret from a mounted file (Docker/Kubernetes secrets)
fn read_secret_file(file_path: &str, secret_name: &str) -> Result<String> {
    std::fs::read_to_string(file_path)
        .map(|s| s.trim().to_string())
        .context(format!("Secret file not found at {} ({})", file_path, secret_name))
}
