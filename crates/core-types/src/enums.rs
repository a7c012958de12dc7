use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Identifies which entry strategy drives a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    /// Enters when the last three samples are strictly increasing.
    SwingHigh,
    /// Enters once on the first evaluation and holds.
    BuyAndHold,
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyId::SwingHigh => write!(f, "swing_high"),
            StrategyId::BuyAndHold => write!(f, "buy_and_hold"),
        }
    }
}

/// Why an open position was (or is about to be) closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    SessionEnd,
    /// The broker no longer reports the position.
    BrokerFlat,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitReason::StopLoss => "stop-loss",
            ExitReason::TakeProfit => "take-profit",
            ExitReason::SessionEnd => "session-end",
            ExitReason::BrokerFlat => "broker-flat",
        };
        f.write_str(label)
    }
}
