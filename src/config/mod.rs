use std::{fs, path::PathBuf, time::Duration as StdDuration};

use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    currency::CurrencyCode,
    errors::LedgerError,
    utils::paths::{ensure_dir, write_atomic, PathResolver},
};

/// Timing knobs for the reminder sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerSettings {
    pub interval_secs: u64,
    pub catch_up_window_secs: i64,
    pub delivery_timeout_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            catch_up_window_secs: 300,
            delivery_timeout_secs: 10,
        }
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> StdDuration {
        StdDuration::from_secs(self.interval_secs.max(1))
    }

    pub fn catch_up_window(&self) -> Duration {
        Duration::seconds(self.catch_up_window_secs.max(0))
    }

    pub fn delivery_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.delivery_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_currency: CurrencyCode,
    pub accepted_currencies: Vec<CurrencyCode>,
    pub min_contact_name_len: usize,
    pub history_limit: usize,
    /// Offset used to interpret "today", "tomorrow" and typed clock times.
    pub utc_offset_minutes: i32,
    pub default_language: String,
    pub languages: Vec<String>,
    pub scheduler: SchedulerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_currency: CurrencyCode::new("DZD"),
            accepted_currencies: ["DZD", "USD", "EUR"]
                .into_iter()
                .map(CurrencyCode::new)
                .collect(),
            min_contact_name_len: 2,
            history_limit: 10,
            utc_offset_minutes: 0,
            default_language: "en".into(),
            languages: vec!["en".into(), "fr".into(), "ar".into()],
            scheduler: SchedulerSettings::default(),
        }
    }
}

impl Config {
    /// Offset for local dates; out-of-range values fall back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        self.checked_offset().unwrap_or_else(|| Utc.fix())
    }

    fn checked_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.accepted_currencies.is_empty() {
            return Err(LedgerError::Config(
                "at least one accepted currency is required".into(),
            ));
        }
        if !self.accepted_currencies.contains(&self.default_currency) {
            return Err(LedgerError::Config(format!(
                "default currency `{}` is not in the accepted list",
                self.default_currency
            )));
        }
        if !self.languages.contains(&self.default_language) {
            return Err(LedgerError::Config(format!(
                "default language `{}` is not offered",
                self.default_language
            )));
        }
        if self.checked_offset().is_none() {
            return Err(LedgerError::Config(format!(
                "utc offset of {} minutes is out of range",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

/// Loads and saves `config.json` under the application home.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    /// Returns the stored configuration, or defaults when none was written yet.
    pub fn load(&self) -> Result<Config, LedgerError> {
        let config = if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data).map_err(|err| {
                LedgerError::Config(format!("{}: {}", self.path.display(), err))
            })?
        } else {
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
