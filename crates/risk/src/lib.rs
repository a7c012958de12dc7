//! # Swingline Risk
//!
//! Threshold math and position sizing. `RiskThresholds` turns an entry price into
//! stop-loss and take-profit levels; a `RiskManager` turns available cash into a
//! whole-unit order quantity.

pub mod error;
pub mod simple_manager;
pub mod thresholds;

pub use error::RiskError;
pub use simple_manager::{AllocationSizer, FixedQuantitySizer};
pub use thresholds::{MAX_STOP_LOSS_PCT, MAX_TAKE_PROFIT_PCT, RiskParameters, RiskThresholds};

use configuration::{RiskManagement, SizingConfig};
use rust_decimal::Decimal;

/// Decides how many units an entry buys.
pub trait RiskManager: Send + Sync {
    /// Returns the number of whole units to buy at `entry_price` given the available
    /// `cash`. Zero means the entry cannot be funded.
    fn size_entry(&self, entry_price: Decimal, cash: Decimal) -> Result<u64, RiskError>;
}

/// Builds the sizing policy named in the configuration.
///
/// `enabled_bots` is the number of instruments sharing the account, used by
/// equal-weight sizing.
pub fn create_risk_manager(
    sizing: &SizingConfig,
    enabled_bots: usize,
) -> Result<Box<dyn RiskManager>, RiskError> {
    match sizing {
        SizingConfig::EqualWeight => Ok(Box::new(AllocationSizer::equal_weight(enabled_bots)?)),
        SizingConfig::Allocation { fraction } => Ok(Box::new(AllocationSizer::new(*fraction)?)),
        SizingConfig::Fixed { quantity } => Ok(Box::new(FixedQuantitySizer::new(*quantity)?)),
    }
}

impl TryFrom<&RiskManagement> for RiskParameters {
    type Error = RiskError;

    fn try_from(params: &RiskManagement) -> Result<Self, Self::Error> {
        RiskParameters::new(
            params.stop_loss_pct,
            params.take_profit_pct,
            params.assumed_slippage_pct,
        )
    }
}
