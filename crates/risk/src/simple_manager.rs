use crate::error::RiskError;
use crate::RiskManager;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Commits a fixed fraction of available cash to each entry.
///
/// Quantity is `floor(cash * fraction / entry_price)`; a result of zero means the
/// account cannot afford a single unit.
#[derive(Debug, Clone)]
pub struct AllocationSizer {
    fraction: Decimal,
}

impl AllocationSizer {
    pub fn new(fraction: Decimal) -> Result<Self, RiskError> {
        if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
            return Err(RiskError::InvalidConfiguration(format!(
                "allocation fraction must be in (0, 1] (got {fraction})"
            )));
        }
        Ok(Self { fraction })
    }

    /// Splits cash evenly across `bots` instruments.
    pub fn equal_weight(bots: usize) -> Result<Self, RiskError> {
        if bots == 0 {
            return Err(RiskError::InvalidConfiguration(
                "equal-weight sizing needs at least one enabled bot".to_string(),
            ));
        }
        Self::new(Decimal::ONE / Decimal::from(bots))
    }

    pub fn fraction(&self) -> Decimal {
        self.fraction
    }
}

impl RiskManager for AllocationSizer {
    fn size_entry(&self, entry_price: Decimal, cash: Decimal) -> Result<u64, RiskError> {
        if entry_price <= Decimal::ZERO {
            return Err(RiskError::InvalidEntryPrice(entry_price));
        }
        if cash <= Decimal::ZERO {
            return Ok(0);
        }
        let units = (cash * self.fraction)
            .checked_div(entry_price)
            .ok_or(RiskError::QuantityOverflow(cash))?
            .floor();
        units.to_u64().ok_or(RiskError::QuantityOverflow(units))
    }
}

/// Buys the same number of units on every entry, provided cash covers them.
#[derive(Debug, Clone)]
pub struct FixedQuantitySizer {
    quantity: u64,
}

impl FixedQuantitySizer {
    pub fn new(quantity: u64) -> Result<Self, RiskError> {
        if quantity == 0 {
            return Err(RiskError::InvalidConfiguration(
                "fixed quantity must be greater than 0".to_string(),
            ));
        }
        Ok(Self { quantity })
    }
}

impl RiskManager for FixedQuantitySizer {
    fn size_entry(&self, entry_price: Decimal, cash: Decimal) -> Result<u64, RiskError> {
        if entry_price <= Decimal::ZERO {
            return Err(RiskError::InvalidEntryPrice(entry_price));
        }
        // An order value too large for Decimal is unaffordable by definition.
        match Decimal::from(self.quantity).checked_mul(entry_price) {
            Some(cost) if cost <= cash => Ok(self.quantity),
            _ => Ok(0),
        }
    }
}
