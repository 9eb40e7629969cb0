use std::env;
use std::str::FromStr;

use crate::blockchain::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8088;

/// Process settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub difficulty: u32,
}

impl Config {
    /// Read `HOST`, `PORT` and `DIFFICULTY` from the process environment
    /// (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset keys fall back to defaults;
    /// set but unparsable values are an error, as is a difficulty no digest can meet.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let difficulty = parse_or(&lookup, "DIFFICULTY", DEFAULT_DIFFICULTY)?;
        if difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::OutOfRange {
                key: "DIFFICULTY",
                value: difficulty,
                max: MAX_DIFFICULTY,
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            difficulty,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
