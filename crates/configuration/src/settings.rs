use crate::error::ConfigError;
use core_types::StrategyId;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on `take_profit_pct`.
const MAX_TAKE_PROFIT_PCT: u32 = 1000;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,
    pub risk_management: RiskManagement,
    pub bots: Vec<BotConfig>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Parameters for the step-driven trading loop.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Seconds between two trading iterations.
    #[serde(default = "default_sleep_interval_secs")]
    pub sleep_interval_secs: u64,
    /// Keep only the most recent N samples per instrument. `None` keeps everything.
    #[serde(default)]
    pub history_capacity: Option<usize>,
}

impl EngineSettings {
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.sleep_interval_secs)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sleep_interval_secs: default_sleep_interval_secs(),
            history_capacity: None,
        }
    }
}

/// Contains parameters for trade-level risk management.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskManagement {
    /// Distance below the entry price, in percent, at which the position is stopped out.
    /// 0.5 means 0.5%.
    pub stop_loss_pct: Decimal,
    /// Distance above the entry price, in percent, at which profit is taken.
    pub take_profit_pct: Decimal,
    /// Assumed slippage between the trigger sample and the real fill, in percent.
    /// The entry price used for thresholds is `trigger * (1 + assumed_slippage_pct / 100)`.
    #[serde(default)]
    pub assumed_slippage_pct: Decimal,
    #[serde(default)]
    pub sizing: SizingConfig,
}

/// How many units an entry buys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizingConfig {
    /// Split available cash evenly across all enabled bots.
    #[default]
    EqualWeight,
    /// Commit a fixed fraction of available cash to each entry.
    Allocation { fraction: Decimal },
    /// Buy a fixed number of units on every entry.
    Fixed { quantity: u64 },
}

/// A single instrument traded by a single strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    pub strategy_id: StrategyId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_sleep_interval_secs() -> u64 {
    10
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "swingline.log".to_string()
}

impl Config {
    /// Returns the bots that should be traded.
    pub fn enabled_bots(&self) -> impl Iterator<Item = &BotConfig> {
        self.bots.iter().filter(|bot| bot.enabled)
    }

    /// Rejects configurations that must never reach live trading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let risk = &self.risk_management;
        for (name, value) in [
            ("stop_loss_pct", risk.stop_loss_pct),
            ("take_profit_pct", risk.take_profit_pct),
            ("assumed_slippage_pct", risk.assumed_slippage_pct),
        ] {
            if value < Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must not be negative (got {value})"
                )));
            }
        }
        // A 100% stop sits at zero and can never be breached by a valid price.
        if risk.stop_loss_pct >= Decimal::ONE_HUNDRED {
            return Err(ConfigError::ValidationError(format!(
                "stop_loss_pct must be below 100 (got {})",
                risk.stop_loss_pct
            )));
        }
        if risk.take_profit_pct > Decimal::from(MAX_TAKE_PROFIT_PCT) {
            return Err(ConfigError::ValidationError(format!(
                "take_profit_pct must be at most {MAX_TAKE_PROFIT_PCT} (got {})",
                risk.take_profit_pct
            )));
        }

        match &risk.sizing {
            SizingConfig::Allocation { fraction }
                if *fraction <= Decimal::ZERO || *fraction > Decimal::ONE =>
            {
                return Err(ConfigError::ValidationError(format!(
                    "allocation fraction must be in (0, 1] (got {fraction})"
                )));
            }
            SizingConfig::Fixed { quantity: 0 } => {
                return Err(ConfigError::ValidationError(
                    "fixed sizing quantity must be greater than 0".to_string(),
                ));
            }
            _ => {}
        }

        if self.engine.sleep_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sleep_interval_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(capacity) = self.engine.history_capacity {
            // The swing-high rule looks at three samples.
            if capacity < 3 {
                return Err(ConfigError::ValidationError(format!(
                    "history_capacity must be at least 3 (got {capacity})"
                )));
            }
        }

        let mut seen = HashSet::new();
        for bot in &self.bots {
            let symbol = bot.symbol.trim();
            if symbol.is_empty() {
                return Err(ConfigError::ValidationError(
                    "bot symbol must not be empty".to_string(),
                ));
            }
            if !seen.insert(symbol.to_string()) {
                return Err(ConfigError::ValidationError(format!(
                    "symbol '{symbol}' is configured more than once"
                )));
            }
        }
        if self.enabled_bots().next().is_none() {
            return Err(ConfigError::ValidationError(
                "at least one bot must be enabled".to_string(),
            ));
        }

        Ok(())
    }
}
