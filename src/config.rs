//! Runtime configuration from environment variables.
//!
//! `main` loads a `.env` file first, so any of these can live there too:
//! - `CIDR_CALC_LOG_CONFIG` - log4rs config file (default `log4rs.yml`)
//! - `CIDR_CALC_STRATEGY` - default VLSM strategy (default `largest-first`)
//! - `CIDR_CALC_OUTPUT` - `csv` or `json` (default `csv`)

use crate::error::{Error, Result};
use crate::models::VlsmStrategy;
use std::str::FromStr;

pub const ENV_LOG_CONFIG: &str = "CIDR_CALC_LOG_CONFIG";
pub const ENV_STRATEGY: &str = "CIDR_CALC_STRATEGY";
pub const ENV_OUTPUT: &str = "CIDR_CALC_OUTPUT";

const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::format(format!("unknown output format '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_config: String,
    pub strategy: VlsmStrategy,
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_config: DEFAULT_LOG_CONFIG.to_string(),
            strategy: VlsmStrategy::default(),
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup; unset or blank keys keep
    /// their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(path) = get(ENV_LOG_CONFIG) {
            config.log_config = path;
        }
        if let Some(strategy) = get(ENV_STRATEGY) {
            config.strategy = strategy.parse()?;
        }
        if let Some(output) = get(ENV_OUTPUT) {
            config.output = output.parse()?;
        }

        log::debug!("config: {config:?}");
        Ok(config)
    }
}
