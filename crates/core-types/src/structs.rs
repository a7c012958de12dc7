use crate::enums::OrderSide;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A tradable symbol. Every price history and position state is keyed by one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Instrument {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        if symbol.is_empty() {
            return Err(CoreError::InvalidInput(
                "instrument".to_string(),
                "symbol must not be empty".to_string(),
            ));
        }
        Ok(Self(symbol.to_string()))
    }
}

/// The outcome of one evaluation step, handed to the order sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Buy `quantity` whole units of `instrument`.
    EnterLong { instrument: Instrument, quantity: u64 },
    /// Liquidate everything held in `instrument`.
    ExitAll { instrument: Instrument },
    NoAction,
}

impl Decision {
    /// True for decisions that must be forwarded to the order sink.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Decision::NoAction)
    }

    pub fn instrument(&self) -> Option<&Instrument> {
        match self {
            Decision::EnterLong { instrument, .. } | Decision::ExitAll { instrument } => {
                Some(instrument)
            }
            Decision::NoAction => None,
        }
    }
}

/// The broker's view of a held position, as reported by the position oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHandle {
    pub instrument: Instrument,
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
}

impl PositionHandle {
    /// A handle with zero or negative quantity carries no position.
    pub fn is_held(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}

/// A fill receipt recorded by an order sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub client_order_id: Uuid,
    pub instrument: Instrument,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}
