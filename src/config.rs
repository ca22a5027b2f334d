//! Environment-driven configuration.
//!
//! Values come from the process environment, after `main` has loaded any
//! `.env` file with `dotenvy`. Every setting has a default:
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | `sqlite:database/prices.db` |
//! | `USER_AGENT` | a desktop Chrome identity |
//! | `FETCH_TIMEOUT_SECS` | `30` |
//! | `MAX_CONCURRENCY` | `1` (sequential, to stay polite to vendor sites) |
//! | `MAX_RETRIES` | `0` |
//! | `RETRY_BACKOFF_MS` | `1000` |
//! | `CHECK_SCHEDULE` | `0 0 * * * *` (hourly) |
//! | `REFERENCE_WEBSITE` | `MyStore` |
//! | `PROFILES_PATH` | unset |
//! | `SIMULATE_ON_FAILURE` | `true` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::fetcher::BROWSER_USER_AGENT;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:database/prices.db";
pub const DEFAULT_CHECK_SCHEDULE: &str = "0 0 * * * *";
pub const DEFAULT_REFERENCE_WEBSITE: &str = "MyStore";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    /// Ceiling on concurrent extractions during a full price check, at least 1
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Cron expression (with seconds) for the recurring price check
    pub check_schedule: String,
    /// Website whose price the others are compared against
    pub reference_website: String,
    /// Optional JSON file of extra or replacement site profiles
    pub profiles_path: Option<PathBuf>,
    pub simulate_on_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(30),
            max_concurrency: 1,
            max_retries: 0,
            retry_backoff_ms: 1_000,
            check_schedule: DEFAULT_CHECK_SCHEDULE.to_string(),
            reference_website: DEFAULT_REFERENCE_WEBSITE.to_string(),
            profiles_path: None,
            simulate_on_failure: true,
        }
    }
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when a numeric or boolean variable holds an unparsable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Fails when a numeric or boolean variable holds an unparsable value.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let fetch_timeout = parse_var::<u64>(&get, "FETCH_TIMEOUT_SECS")?
            .map_or(defaults.fetch_timeout, Duration::from_secs);

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            user_agent: get("USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout,
            max_concurrency: parse_var::<usize>(&get, "MAX_CONCURRENCY")?
                .unwrap_or(defaults.max_concurrency)
                .max(1),
            max_retries: parse_var(&get, "MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            retry_backoff_ms: parse_var(&get, "RETRY_BACKOFF_MS")?
                .unwrap_or(defaults.retry_backoff_ms),
            check_schedule: get("CHECK_SCHEDULE").unwrap_or(defaults.check_schedule),
            reference_website: get("REFERENCE_WEBSITE").unwrap_or(defaults.reference_website),
            profiles_path: get("PROFILES_PATH").map(PathBuf::from),
            simulate_on_failure: parse_var(&get, "SIMULATE_ON_FAILURE")?
                .unwrap_or(defaults.simulate_on_failure),
        })
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.check_schedule, DEFAULT_CHECK_SCHEDULE);
        assert_eq!(config.reference_website, "MyStore");
        assert!(config.profiles_path.is_none());
        assert!(config.simulate_on_failure);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("FETCH_TIMEOUT_SECS", "5"),
            ("MAX_CONCURRENCY", "4"),
            ("MAX_RETRIES", "2"),
            ("RETRY_BACKOFF_MS", "250"),
            ("PROFILES_PATH", "profiles.json"),
            ("SIMULATE_ON_FAILURE", "false"),
            ("REFERENCE_WEBSITE", "Cửa hàng"),
        ])
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_backoff_ms, 250);
        assert_eq!(config.profiles_path, Some(PathBuf::from("profiles.json")));
        assert!(!config.simulate_on_failure);
        assert_eq!(config.reference_website, "Cửa hàng");
    }

    #[test]
    fn zero_concurrency_is_clamped_to_one() {
        let config = config_from(&[("MAX_CONCURRENCY", "0")]).unwrap();
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("USER_AGENT", "  "), ("MAX_RETRIES", "")]).unwrap();
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = config_from(&[("FETCH_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("FETCH_TIMEOUT_SECS"));
    }
}
