use crate::error::StrategyError;
use crate::history::PriceHistory;
use crate::{EntrySignal, Strategy};
use core_types::StrategyId;

/// Buys once, on the first evaluation for its instrument, and holds.
///
/// The entry is a one-shot: once the buy order has been accepted, or found to be
/// unfundable, no further signals are produced. A refused order is retried on the
/// next evaluation. The position is never exited
/// on thresholds and survives the end-of-session close.
pub struct BuyAndHold {
    symbol: String,
    entry_attempted: bool,
}

impl BuyAndHold {
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            entry_attempted: false,
        }
    }
}

impl Strategy for BuyAndHold {
    fn id(&self) -> StrategyId {
        StrategyId::BuyAndHold
    }

    fn evaluate(&self, history: &PriceHistory) -> Result<Option<EntrySignal>, StrategyError> {
        if self.entry_attempted {
            return Ok(None);
        }
        Ok(history.latest().map(|trigger_price| {
            tracing::debug!(symbol = %self.symbol, %trigger_price, "BuyAndHold: initial entry");
            EntrySignal { trigger_price }
        }))
    }

    fn mark_entry_attempted(&mut self) {
        self.entry_attempted = true;
    }

    fn manages_exits(&self) -> bool {
        false
    }

    fn flattens_at_session_end(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn signals_once_then_stays_quiet() {
        let mut strategy = BuyAndHold::new("AAPL".to_string());
        let mut history = PriceHistory::new();
        assert_eq!(strategy.evaluate(&history).unwrap(), None);

        history.append(150.75).unwrap();
        assert_eq!(
            strategy.evaluate(&history).unwrap(),
            Some(EntrySignal { trigger_price: dec!(150.75) })
        );
        // Evaluation alone does not consume the one-shot.
        assert!(strategy.evaluate(&history).unwrap().is_some());

        strategy.mark_entry_attempted();
        history.append(151.0).unwrap();
        assert_eq!(strategy.evaluate(&history).unwrap(), None);
    }

    #[test]
    fn holds_through_thresholds_and_session_close() {
        let strategy = BuyAndHold::new("MSFT".to_string());
        assert!(!strategy.manages_exits());
        assert!(!strategy.flattens_at_session_end());
    }
}
