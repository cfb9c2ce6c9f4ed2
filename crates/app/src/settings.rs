//! Settings for `ledgerd`.
//!
//! Values come from an optional `settings.toml` (or the file passed with
//! `--config`), overridden by `LEDGER__*` environment variables, e.g.
//! `LEDGER__SERVER__PORT=8080` or `LEDGER__SCHEDULER__TIMEZONE=Europe/Rome`.
use std::str::FromStr;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite("./ledger.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub enabled: bool,
    /// Local hour (0-23) at which the daily recurring sweep runs.
    pub hour: u32,
    /// IANA name, e.g. `Europe/Rome`.
    pub timezone: String,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: 2,
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Budgets {
    /// Transaction writes update matching budgets in the same unit of work.
    pub tracking: bool,
}

impl Default for Budgets {
    fn default() -> Self {
        Self { tracking: true }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub server: Option<Server>,
    pub scheduler: Scheduler,
    pub budgets: Budgets,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LEDGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.hour > 23 {
            return Err(ConfigError::Message(format!(
                "scheduler.hour must be between 0 and 23, got {}",
                self.scheduler.hour
            )));
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        Tz::from_str(&self.scheduler.timezone).map_err(|_| {
            ConfigError::Message(format!(
                "unknown scheduler.timezone '{}'",
                self.scheduler.timezone
            ))
        })
    }
}
