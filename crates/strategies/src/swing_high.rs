use crate::error::StrategyError;
use crate::history::PriceHistory;
use crate::pattern::{SWING_HIGH_WINDOW, detect_swing_high};
use crate::{EntrySignal, Strategy};
use core_types::StrategyId;

/// Enters long when the last three samples are strictly increasing.
///
/// The most recent sample of the window is reported as the trigger price; the
/// controller turns it into an assumed fill price. Exits are left to the stop-loss
/// and take-profit thresholds and to the end-of-session flatten.
pub struct SwingHigh {
    symbol: String,
}

impl SwingHigh {
    pub fn new(symbol: String) -> Self {
        Self { symbol }
    }
}

impl Strategy for SwingHigh {
    fn id(&self) -> StrategyId {
        StrategyId::SwingHigh
    }

    fn evaluate(&self, history: &PriceHistory) -> Result<Option<EntrySignal>, StrategyError> {
        if history.len() < SWING_HIGH_WINDOW {
            tracing::debug!(
                symbol = %self.symbol,
                samples = history.len(),
                "SwingHigh: warming up"
            );
            return Ok(None);
        }

        let window = history.last(SWING_HIGH_WINDOW)?;
        let &[p0, p1, p2] = window.as_slice() else {
            return Err(StrategyError::InsufficientHistory {
                requested: SWING_HIGH_WINDOW,
                available: window.len(),
            });
        };

        if !detect_swing_high(&[p0, p1, p2]) {
            return Ok(None);
        }

        tracing::info!(
            symbol = %self.symbol,
            "Swing high pattern detected. Last 3 prices: [{}, {}, {}]",
            p0, p1, p2
        );
        Ok(Some(EntrySignal { trigger_price: p2 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn history_of(prices: &[f64]) -> PriceHistory {
        let mut history = PriceHistory::new();
        for price in prices {
            history.append(*price).unwrap();
        }
        history
    }

    #[test]
    fn warm_up_yields_no_signal() {
        let strategy = SwingHigh::new("GOOG".to_string());
        assert_eq!(strategy.evaluate(&history_of(&[100.0, 105.0])).unwrap(), None);
    }

    #[test]
    fn rising_window_signals_at_latest_sample() {
        let strategy = SwingHigh::new("GOOG".to_string());
        let signal = strategy.evaluate(&history_of(&[120.0, 100.0, 105.0, 110.0])).unwrap();
        assert_eq!(signal, Some(EntrySignal { trigger_price: dec!(110) }));
    }

    #[test]
    fn only_the_most_recent_window_counts() {
        let strategy = SwingHigh::new("GOOG".to_string());
        let signal = strategy.evaluate(&history_of(&[100.0, 105.0, 110.0, 90.0])).unwrap();
        assert_eq!(signal, None);
    }
}
