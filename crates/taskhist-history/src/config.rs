//! History configuration.
//!
//! Reads from environment variables:
//! - `TASKHIST_MAX_HISTORY`: number of entries kept before the oldest is
//!   evicted (default: 20)

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAX_HISTORY: usize = 20;
pub const MAX_HISTORY_ENV: &str = "TASKHIST_MAX_HISTORY";

/// Settings for a [`HistoryManager`](crate::HistoryManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Capacity of the log. Always at least 1.
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl HistoryConfig {
    pub fn new(max_history: usize) -> Result<Self, ConfigError> {
        if max_history == 0 {
            return Err(ConfigError::InvalidMaxHistory {
                value: max_history.to_string(),
            });
        }
        Ok(HistoryConfig { max_history })
    }

    /// Loads the configuration from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_value(std::env::var(MAX_HISTORY_ENV).ok().as_deref())
    }

    /// Builds the configuration from the raw `TASKHIST_MAX_HISTORY` value.
    pub fn from_value(max_history: Option<&str>) -> Result<Self, ConfigError> {
        match max_history.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => {
                let parsed = raw
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidMaxHistory {
                        value: raw.to_string(),
                    })?;
                Self::new(parsed)
            }
        }
    }
}
