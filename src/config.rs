use std::ops::RangeInclusive;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File consulted by [`Config::load`].
pub const CONFIG_FILE: &str = "Election.toml";

/// Prefix of the environment variables consulted by [`Config::load`].
pub const ENV_PREFIX: &str = "ELECTION_";

/// Election configuration, derived from built-in defaults, `Election.toml`
/// and `ELECTION_*` environment variables, in increasing order of precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    min_duration: u32,
    max_duration: u32,
}

impl Config {
    /// Build a config from explicit bounds, checking that they are usable.
    pub fn new(min_duration: u32, max_duration: u32) -> Result<Self> {
        let config = Self {
            min_duration,
            max_duration,
        };
        config.validate()?;
        Ok(config)
    }

    /// The layered configuration sources.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration from all sources.
    pub fn load() -> Result<Self> {
        Self::from_figment(&Self::figment())
    }

    /// Extract and validate a configuration from the given figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        debug!(
            "Loaded election config: durations {}..={}s",
            config.min_duration, config.max_duration
        );
        Ok(config)
    }

    /// Admissible durations in whole seconds, inclusive at both ends.
    /// Configured via `MIN_DURATION` and `MAX_DURATION`.
    pub fn duration_window(&self) -> RangeInclusive<u32> {
        self.min_duration..=self.max_duration
    }

    fn validate(&self) -> Result<()> {
        if self.min_duration == 0 {
            let reason = "`min_duration` must be at least one second".to_string();
            return Err(figment::Error::from(reason).into());
        }
        if self.min_duration > self.max_duration {
            return Err(figment::Error::from(format!(
                "`min_duration` ({}) exceeds `max_duration` ({})",
                self.min_duration, self.max_duration
            ))
            .into());
        }
        Ok(())
    }
}

impl Default for Config {
    /// Elections last between 15 and 30 minutes.
    fn default() -> Self {
        Self {
            min_duration: 15 * 60,
            max_duration: 30 * 60,
        }
    }
}
