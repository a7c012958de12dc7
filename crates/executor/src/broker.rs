use crate::error::BrokerError;
use core_types::{Decision, Instrument, PositionHandle};
use rust_decimal::Decimal;

/// Latest traded price per instrument.
pub trait PriceSource {
    /// `Ok(None)` means no price is available this cycle. It is never a price of zero.
    fn get_last_price(&self, instrument: &Instrument) -> Result<Option<f64>, BrokerError>;
}

/// The broker's record of what is actually held.
pub trait PositionOracle {
    /// `Ok(None)` means the broker holds nothing in `instrument`.
    fn get_position(&self, instrument: &Instrument) -> Result<Option<PositionHandle>, BrokerError>;
}

/// Accepts decisions and turns them into orders.
///
/// Acceptance says nothing about the fill price; callers must not assume the order
/// filled at the price they last saw.
pub trait OrderSink {
    fn submit(&mut self, decision: &Decision) -> Result<(), BrokerError>;
}

/// Read-only account figures used for sizing and reporting.
pub trait AccountSource {
    fn get_cash(&self) -> Result<Decimal, BrokerError>;
    fn get_portfolio_value(&self) -> Result<Decimal, BrokerError>;
}

/// Everything a trading session needs from the outside world.
pub trait Broker: PriceSource + PositionOracle + OrderSink + AccountSource {}

impl<T> Broker for T where T: PriceSource + PositionOracle + OrderSink + AccountSource {}
