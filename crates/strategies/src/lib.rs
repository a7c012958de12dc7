//! # Swingline Strategy Library
//!
//! This crate contains the entry logic for the Swingline system: the per-instrument
//! price history, the swing-high pattern rule and the `Strategy` trait with its
//! concrete implementations.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** This crate has no knowledge of brokers, orders or positions. A
//!   strategy only looks at a `PriceHistory` and says whether it wants to enter.
//! - **Strategy agnostic engine:** The engine drives any `Strategy` through the trait
//!   and owns the position state itself, so the at-most-one-position rule lives in
//!   one place.
//! - **Extensibility:** Adding a strategy means a new module, a `StrategyId` variant
//!   and a match arm in `factory`.

// Declare all the modules that constitute this crate.
pub mod buy_and_hold;
pub mod error;
pub mod factory;
pub mod history;
pub mod pattern;
pub mod swing_high;

// Re-export the key components to create a clean, public-facing API.
pub use buy_and_hold::BuyAndHold;
pub use error::StrategyError;
pub use factory::create_strategy;
pub use history::PriceHistory;
pub use pattern::{SWING_HIGH_WINDOW, detect_swing_high};
pub use swing_high::SwingHigh;

// Re-export StrategyId from core_types
pub use core_types::StrategyId;

use rust_decimal::Decimal;

/// A request to open a long position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySignal {
    /// The sample that triggered the entry. The real fill may differ.
    pub trigger_price: Decimal,
}

/// The core trait that all trading strategies must implement.
///
/// `evaluate` takes `&self` so that asking for a signal never changes strategy
/// state; a strategy that needs to remember an entry does so in
/// `mark_entry_attempted`, which the engine calls only once the entry order has
/// been accepted or the entry was found to be unfundable. The `Send + Sync` bounds let a host scheduler move bots across threads.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Evaluates the strategy against the instrument's price history.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(EntrySignal))` - if the entry conditions are met.
    /// * `Ok(None)` - if they are not, including during warm-up.
    /// * `Err(StrategyError)` - if the history could not be evaluated.
    fn evaluate(&self, history: &PriceHistory) -> Result<Option<EntrySignal>, StrategyError>;

    /// Called after an entry order was accepted, or the entry was dropped for lack of
    /// funds. A refused order does not count as an attempt.
    fn mark_entry_attempted(&mut self) {}

    /// Whether stop-loss and take-profit thresholds close this strategy's positions.
    fn manages_exits(&self) -> bool {
        true
    }

    /// Whether open positions are liquidated at the end of the session.
    fn flattens_at_session_end(&self) -> bool {
        true
    }
}
