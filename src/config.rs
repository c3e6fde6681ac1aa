use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};
use thiserror::Error;

use crate::constants::RECIPE_COUNT_PER_PAGE;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(String),

    #[error("Invalid {key} value: {info}")]
    Invalid { key: String, info: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub session_hours: i64,
    pub page_size: i64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; `load` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: require(&lookup, "DATABASE_URL")?,
            max_connections: at_least_one(
                "DATABASE_MAX_CONNECTIONS",
                try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            )?,
            jwt_secret: require(&lookup, "JWT_SECRET")?,
            session_hours: try_load(&lookup, "SESSION_HOURS", "24")?,
            page_size: at_least_one(
                "PAGE_SIZE",
                try_load(&lookup, "PAGE_SIZE", &RECIPE_COUNT_PER_PAGE.to_string())?,
            )?,
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            warn!("Environment variable {key} not found");
            ConfigError::Missing(key.to_string())
        })
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse::<T>()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                info: e.to_string(),
            }
        })
}

fn at_least_one<T>(key: &str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + From<u8> + Display,
{
    if value < T::from(1) {
        warn!("Invalid {key} value: {value}");
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            info: format!("must be at least 1, got {value}"),
        });
    }
    Ok(value)
}
