use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RiskError {
    #[error("Risk parameters are invalid: {0}")]
    InvalidConfiguration(String),

    #[error("The provided entry price ({0}) is zero or negative.")]
    InvalidEntryPrice(Decimal),

    #[error("Price {0} is too large to derive thresholds or order values from.")]
    PriceOverflow(Decimal),

    #[error("Computed quantity {0} does not fit in a whole-unit order.")]
    QuantityOverflow(Decimal),
}
