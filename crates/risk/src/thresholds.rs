use crate::error::RiskError;
use core_types::ExitReason;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Stop-loss and take-profit levels for one open position.
///
/// Derived once from the entry price and never recomputed while the position is
/// open; a new entry produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskThresholds {
    entry_price: Decimal,
    stop_loss_price: Decimal,
    take_profit_price: Decimal,
}

impl RiskThresholds {
    /// Percentages are expressed in percent: `0.5` is half a percent.
    pub fn from_entry(
        entry_price: Decimal,
        stop_loss_pct: Decimal,
        take_profit_pct: Decimal,
    ) -> Result<Self, RiskError> {
        if entry_price <= Decimal::ZERO {
            return Err(RiskError::InvalidEntryPrice(entry_price));
        }
        check_non_negative("stop_loss_pct", stop_loss_pct)?;
        check_non_negative("take_profit_pct", take_profit_pct)?;

        let scale = |pct: Decimal| entry_price.checked_mul(pct / dec!(100));
        let stop_distance = scale(stop_loss_pct).ok_or(RiskError::PriceOverflow(entry_price))?;
        let target_distance = scale(take_profit_pct).ok_or(RiskError::PriceOverflow(entry_price))?;
        let take_profit_price = entry_price
            .checked_add(target_distance)
            .ok_or(RiskError::PriceOverflow(entry_price))?;

        Ok(Self {
            entry_price,
            stop_loss_price: entry_price - stop_distance,
            take_profit_price,
        })
    }

    pub fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    pub fn stop_loss_price(&self) -> Decimal {
        self.stop_loss_price
    }

    pub fn take_profit_price(&self) -> Decimal {
        self.take_profit_price
    }

    pub fn is_stop_loss_breached(&self, current_price: Decimal) -> bool {
        current_price <= self.stop_loss_price
    }

    pub fn is_take_profit_breached(&self, current_price: Decimal) -> bool {
        current_price >= self.take_profit_price
    }

    /// Checks both thresholds, stop-loss first.
    pub fn breach(&self, current_price: Decimal) -> Option<ExitReason> {
        if self.is_stop_loss_breached(current_price) {
            Some(ExitReason::StopLoss)
        } else if self.is_take_profit_breached(current_price) {
            Some(ExitReason::TakeProfit)
        } else {
            None
        }
    }
}

/// A stop-loss of 100% or more would put the stop at or below zero.
pub const MAX_STOP_LOSS_PCT: Decimal = dec!(100);

/// Upper bound on the take-profit distance, in percent.
pub const MAX_TAKE_PROFIT_PCT: Decimal = dec!(1000);

/// Validated risk settings shared by every instrument of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParameters {
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
    assumed_slippage_pct: Decimal,
}

impl RiskParameters {
    pub fn new(
        stop_loss_pct: Decimal,
        take_profit_pct: Decimal,
        assumed_slippage_pct: Decimal,
    ) -> Result<Self, RiskError> {
        check_non_negative("stop_loss_pct", stop_loss_pct)?;
        check_non_negative("take_profit_pct", take_profit_pct)?;
        check_non_negative("assumed_slippage_pct", assumed_slippage_pct)?;
        if stop_loss_pct >= MAX_STOP_LOSS_PCT {
            return Err(RiskError::InvalidConfiguration(format!(
                "stop_loss_pct must be below {MAX_STOP_LOSS_PCT} (got {stop_loss_pct})"
            )));
        }
        if take_profit_pct > MAX_TAKE_PROFIT_PCT {
            return Err(RiskError::InvalidConfiguration(format!(
                "take_profit_pct must not exceed {MAX_TAKE_PROFIT_PCT} (got {take_profit_pct})"
            )));
        }
        Ok(Self {
            stop_loss_pct,
            take_profit_pct,
            assumed_slippage_pct,
        })
    }

    pub fn stop_loss_pct(&self) -> Decimal {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> Decimal {
        self.take_profit_pct
    }

    /// The price an entry is assumed to fill at.
    ///
    /// No fill report is consulted; with zero slippage this is the trigger sample itself.
    pub fn assumed_fill_price(&self, trigger_price: Decimal) -> Result<Decimal, RiskError> {
        trigger_price
            .checked_mul(Decimal::ONE + self.assumed_slippage_pct / dec!(100))
            .ok_or(RiskError::PriceOverflow(trigger_price))
    }

    pub fn thresholds_for(&self, entry_price: Decimal) -> Result<RiskThresholds, RiskError> {
        RiskThresholds::from_entry(entry_price, self.stop_loss_pct, self.take_profit_pct)
    }
}

fn check_non_negative(name: &str, value: Decimal) -> Result<(), RiskError> {
    if value < Decimal::ZERO {
        return Err(RiskError::InvalidConfiguration(format!(
            "{name} must not be negative (got {value})"
        )));
    }
    Ok(())
}
