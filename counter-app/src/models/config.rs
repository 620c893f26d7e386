use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use getset::Getters;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use strum_macros::{Display, EnumString};

use crate::error::AppError;

pub const CONFIG_ENV: &str = "COUNTER_APP_CONFIG";
pub const ENV_PREFIX: &str = "COUNTER_APP_";
const DEFAULT_CONFIG_FILE: &str = "counter-app.yaml";

/// One press of a counter button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
pub enum Click {
    /// Increment, superseding any increment still in flight.
    #[strum(to_string = "increment_with_abort", serialize = "abort")]
    IncrementWithAbort,
    /// Plain increment.
    #[strum(to_string = "increment", serialize = "plain")]
    Increment,
}

#[serde_inline_default]
#[derive(Clone, Debug, Serialize, Deserialize, Getters)]
#[get = "pub"]
pub struct Config {
    /// Artificial latency in front of the schema.
    #[serde_inline_default(300)]
    latency_ms: u64,
    /// Pause between two scripted clicks.
    #[serde_inline_default(100)]
    click_interval_ms: u64,
    #[serde_inline_default(String::from("abortKey"))]
    abort_context_key: String,
    #[serde_inline_default(String::from("op1"))]
    abort_key: String,
    #[serde_inline_default(String::from("info"))]
    log_level: String,
    #[serde_inline_default(Config::default_clicks())]
    clicks: Vec<Click>,
}

impl Config {
    fn default_clicks() -> Vec<Click> {
        vec![
            Click::IncrementWithAbort,
            Click::IncrementWithAbort,
            Click::IncrementWithAbort,
            Click::Increment,
        ]
    }

    /// Defaults, then the YAML file, then `COUNTER_APP_*` environment variables.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, AppError> {
        Ok(figment.extract()?)
    }

    /// Loads from `$COUNTER_APP_CONFIG` or `counter-app.yaml`. A missing file is not an error.
    pub fn load() -> Result<Self, AppError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        log::debug!("Loading configuration from {}", path.display());
        Self::from_figment(&Self::figment(path))
    }

    pub fn with_clicks(mut self, clicks: Vec<Click>) -> Self {
        self.clicks = clicks;
        self
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn click_interval(&self) -> Duration {
        Duration::from_millis(self.click_interval_ms)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, AppError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| AppError::LogLevel(self.log_level.clone()))
    }
}

/// Parses clicks given on the command line, e.g. `abort abort plain`.
pub fn parse_clicks<I, S>(args: I) -> Result<Vec<Click>, AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.as_ref();
            Click::from_str(arg).map_err(|_| AppError::InvalidClick(arg.to_string()))
        })
        .collect()
}
