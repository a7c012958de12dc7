use crate::broker::{AccountSource, OrderSink, PositionOracle, PriceSource};
use crate::error::BrokerError;
use chrono::Utc;
use core_types::{Decision, Execution, Instrument, OrderSide, PositionHandle};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::HashMap;
use uuid::Uuid;

/// An in-memory broker that fills every order at the current quote.
///
/// It keeps cash, long positions and a log of executions. Quotes are pushed in by
/// the host (a replay or a test) with `set_quote`; there are no fees or slippage.
#[derive(Debug, Clone)]
pub struct PaperBroker {
    cash: Decimal,
    quotes: HashMap<Instrument, f64>,
    positions: HashMap<Instrument, PositionHandle>,
    executions: Vec<Execution>,
}

impl PaperBroker {
    /// Creates a new `PaperBroker` with a given amount of starting cash.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            quotes: HashMap::new(),
            positions: HashMap::new(),
            executions: Vec::new(),
        }
    }

    pub fn set_quote(&mut self, instrument: &Instrument, price: f64) {
        self.quotes.insert(instrument.clone(), price);
    }

    /// Removes the quote so the next price request returns `None`.
    pub fn clear_quote(&mut self, instrument: &Instrument) {
        self.quotes.remove(instrument);
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    pub fn position(&self, instrument: &Instrument) -> Option<&PositionHandle> {
        self.positions.get(instrument)
    }

    /// Records a position that was opened outside this process.
    pub fn open_external_position(
        &mut self,
        instrument: &Instrument,
        quantity: Decimal,
        avg_entry_price: Decimal,
    ) {
        self.positions.insert(
            instrument.clone(),
            PositionHandle {
                instrument: instrument.clone(),
                quantity,
                avg_entry_price,
            },
        );
    }

    /// Liquidates a position outside the order flow (a manual close or a margin call),
    /// crediting cash at the current quote.
    pub fn liquidate_externally(&mut self, instrument: &Instrument) -> Option<PositionHandle> {
        let position = self.positions.remove(instrument)?;
        let price = self
            .fill_price(instrument)
            .unwrap_or(position.avg_entry_price);
        self.cash = self.cash.saturating_add(price.saturating_mul(position.quantity));
        tracing::debug!(%instrument, %price, "PaperBroker: position liquidated externally");
        Some(position)
    }

    fn fill_price(&self, instrument: &Instrument) -> Result<Decimal, BrokerError> {
        self.quotes
            .get(instrument)
            .copied()
            .filter(|price| price.is_finite() && *price > 0.0)
            .and_then(Decimal::from_f64)
            .ok_or_else(|| BrokerError::OrderRejected {
                instrument: instrument.clone(),
                reason: "no usable quote to fill against".to_string(),
            })
    }

    fn record(&mut self, instrument: &Instrument, side: OrderSide, quantity: Decimal, price: Decimal) {
        let execution = Execution {
            client_order_id: Uuid::new_v4(),
            instrument: instrument.clone(),
            side,
            quantity,
            price,
            timestamp: Utc::now(),
        };
        tracing::debug!(?execution, "PaperBroker: filled");
        self.executions.push(execution);
    }

    fn buy(&mut self, instrument: &Instrument, quantity: u64) -> Result<(), BrokerError> {
        if quantity == 0 {
            return Err(BrokerError::OrderRejected {
                instrument: instrument.clone(),
                reason: "quantity must be greater than zero".to_string(),
            });
        }
        let price = self.fill_price(instrument)?;
        let quantity = Decimal::from(quantity);
        let cost = price
            .checked_mul(quantity)
            .ok_or_else(|| overflow(instrument))?;
        if cost > self.cash {
            return Err(BrokerError::OrderRejected {
                instrument: instrument.clone(),
                reason: format!("insufficient cash: required {cost}, available {}", self.cash),
            });
        }
        let (held_quantity, held_cost) = match self.positions.get(instrument) {
            Some(held) => (
                held.quantity,
                held.avg_entry_price
                    .checked_mul(held.quantity)
                    .ok_or_else(|| overflow(instrument))?,
            ),
            None => (Decimal::ZERO, Decimal::ZERO),
        };
        // Average the entry price over the combined quantity.
        let total_quantity = held_quantity
            .checked_add(quantity)
            .ok_or_else(|| overflow(instrument))?;
        let avg_entry_price = held_cost
            .checked_add(cost)
            .and_then(|total_cost| total_cost.checked_div(total_quantity))
            .ok_or_else(|| overflow(instrument))?;

        self.cash -= cost;
        self.positions.insert(
            instrument.clone(),
            PositionHandle {
                instrument: instrument.clone(),
                quantity: total_quantity,
                avg_entry_price,
            },
        );

        self.record(instrument, OrderSide::Buy, quantity, price);
        Ok(())
    }

    fn sell_all(&mut self, instrument: &Instrument) -> Result<(), BrokerError> {
        let Some(quantity) = self.positions.get(instrument).map(|p| p.quantity) else {
            tracing::debug!(%instrument, "PaperBroker: nothing to sell");
            return Ok(());
        };
        let price = self.fill_price(instrument)?;
        let cash = price
            .checked_mul(quantity)
            .and_then(|proceeds| self.cash.checked_add(proceeds))
            .ok_or_else(|| overflow(instrument))?;
        self.positions.remove(instrument);
        self.cash = cash;
        self.record(instrument, OrderSide::Sell, quantity, price);
        Ok(())
    }
}

impl PriceSource for PaperBroker {
    fn get_last_price(&self, instrument: &Instrument) -> Result<Option<f64>, BrokerError> {
        Ok(self.quotes.get(instrument).copied())
    }
}

impl PositionOracle for PaperBroker {
    fn get_position(&self, instrument: &Instrument) -> Result<Option<PositionHandle>, BrokerError> {
        Ok(self.positions.get(instrument).cloned())
    }
}

impl OrderSink for PaperBroker {
    fn submit(&mut self, decision: &Decision) -> Result<(), BrokerError> {
        match decision {
            Decision::EnterLong { instrument, quantity } => self.buy(instrument, *quantity),
            Decision::ExitAll { instrument } => self.sell_all(instrument),
            Decision::NoAction => Ok(()),
        }
    }
}

impl AccountSource for PaperBroker {
    fn get_cash(&self) -> Result<Decimal, BrokerError> {
        Ok(self.cash)
    }

    /// Cash plus every position marked at its quote, or at its entry price when no
    /// quote is available.
    fn get_portfolio_value(&self) -> Result<Decimal, BrokerError> {
        self.positions
            .values()
            .try_fold(self.cash, |total, position| {
                let mark = self
                    .quotes
                    .get(&position.instrument)
                    .copied()
                    .and_then(Decimal::from_f64)
                    .unwrap_or(position.avg_entry_price);
                mark.checked_mul(position.quantity)
                    .and_then(|value| total.checked_add(value))
            })
            .ok_or_else(|| BrokerError::AccountQuery("portfolio value overflows".to_string()))
    }
}

fn overflow(instrument: &Instrument) -> BrokerError {
    BrokerError::OrderRejected {
        instrument: instrument.clone(),
        reason: "order value is too large".to_string(),
    }
}
