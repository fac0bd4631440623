use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::rewards::{Faction, RewardConfig};
use crate::session::SweepConfig;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },
}

/// Runtime settings, read from `ARCADE_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_address: String,
    /// Without a database URL the server keeps everything in memory
    pub database_url: Option<String>,
    pub rewards: RewardConfig,
    pub sweep: SweepConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            database_url: None,
            rewards: RewardConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; unset variables keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let mut config = Self::default();

        if let Some(address) = env.raw("ARCADE_BIND_ADDRESS") {
            config.bind_address = address;
        }
        config.database_url = env.raw("DATABASE_URL").filter(|url| !url.is_empty());

        let rewards = &mut config.rewards;
        env.apply("ARCADE_BASE_CURRENCY", &mut rewards.base_currency)?;
        env.apply("ARCADE_BASE_EXPERIENCE", &mut rewards.base_experience)?;
        env.apply("ARCADE_SPEED_WEIGHT", &mut rewards.speed_weight)?;
        env.apply("ARCADE_ACCURACY_WEIGHT", &mut rewards.accuracy_weight)?;
        env.apply("ARCADE_STREAK_WEIGHT", &mut rewards.streak_weight)?;
        env.apply("ARCADE_VARIETY_WEIGHT", &mut rewards.variety_weight)?;
        env.apply("ARCADE_GUILD_WEIGHT", &mut rewards.guild_weight)?;
        env.apply("ARCADE_PLOT_WEIGHT", &mut rewards.plot_weight)?;
        env.apply("ARCADE_MAX_SPEED_BONUS", &mut rewards.max_speed_bonus)?;
        env.apply("ARCADE_MAX_ACCURACY_BONUS", &mut rewards.max_accuracy_bonus)?;
        env.apply("ARCADE_MAX_VARIETY_BONUS", &mut rewards.max_variety_bonus)?;
        env.apply("ARCADE_MAX_PLOT_BONUS", &mut rewards.max_plot_bonus)?;
        env.apply("ARCADE_MAX_STREAK_STACKS", &mut rewards.max_streak_stacks)?;
        env.apply("ARCADE_MAX_TOTAL_BONUS", &mut rewards.max_total_bonus)?;
        env.apply("ARCADE_STANDARD_DURATION_MS", &mut rewards.standard_duration_ms)?;

        // ARCADE_FACTION_RESOURCES_<FACTION> = "kind:amount,kind:amount"
        for faction in Faction::iter() {
            let name = format!(
                "ARCADE_FACTION_RESOURCES_{}",
                faction.as_ref().to_uppercase()
            );
            if let Some(value) = env.raw(&name) {
                let bundle = parse_bundle(&value).ok_or_else(|| ConfigError::InvalidValue {
                    name: name.clone(),
                    value: value.clone(),
                })?;
                rewards.faction_resources.insert(faction, bundle);
            }
        }

        if let Some(ms) = env.parse::<u64>("ARCADE_SESSION_TIMEOUT_MS")? {
            config.sweep.session_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parse::<u64>("ARCADE_SWEEP_INTERVAL_MS")? {
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "ARCADE_SWEEP_INTERVAL_MS".to_string(),
                    value: ms.to_string(),
                });
            }
            config.sweep.sweep_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.0)(name).map(|value| value.trim().to_string())
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        match self.raw(name) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    name: name.to_string(),
                    value,
                }),
        }
    }

    fn apply<T: FromStr>(&self, name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Some(value) = self.parse(name)? {
            *target = value;
        }
        Ok(())
    }
}

fn parse_bundle(value: &str) -> Option<std::collections::BTreeMap<String, u64>> {
    value
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (kind, amount) = entry.split_once(':')?;
            let kind = kind.trim();
            if kind.is_empty() {
                return None;
            }
            Some((kind.to_string(), amount.trim().parse().ok()?))
        })
        .collect()
}
