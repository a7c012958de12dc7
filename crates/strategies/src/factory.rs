use crate::buy_and_hold::BuyAndHold;
use crate::error::StrategyError;
use crate::swing_high::SwingHigh;
use crate::Strategy;
use core_types::StrategyId;

/// Creates a new strategy instance for `symbol`.
///
/// Every call returns a fresh instance; strategies never share state across
/// instruments or across runs.
pub fn create_strategy(id: StrategyId, symbol: &str) -> Result<Box<dyn Strategy>, StrategyError> {
    if symbol.trim().is_empty() {
        return Err(StrategyError::InvalidParameters(
            "a strategy needs a non-empty symbol".to_string(),
        ));
    }
    // The compiler will error here if a new StrategyId is added but not handled.
    match id {
        StrategyId::SwingHigh => Ok(Box::new(SwingHigh::new(symbol.to_string()))),
        StrategyId::BuyAndHold => Ok(Box::new(BuyAndHold::new(symbol.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_requested_strategy() {
        assert_eq!(create_strategy(StrategyId::SwingHigh, "GOOG").unwrap().id(), StrategyId::SwingHigh);
        assert_eq!(create_strategy(StrategyId::BuyAndHold, "AAPL").unwrap().id(), StrategyId::BuyAndHold);
    }

    #[test]
    fn rejects_blank_symbol() {
        assert!(create_strategy(StrategyId::SwingHigh, " ").is_err());
    }
}
