//! # Swingline Engine
//!
//! The decision core. `TradingIterationController` owns one price history, one
//! position state and one strategy per instrument and turns each new price into a
//! `Decision`. `TradingSession` drives the controller against a `Broker`, keeping
//! local state reconciled with the broker's and rolling back decisions whose orders
//! were refused.
//!
//! The engine is step-driven and synchronous: the host calls `run_cycle` once per
//! sleep interval and `close_session` when the market is about to close.

pub mod controller;
pub mod error;
pub mod position;
pub mod reconciler;
pub mod session;

pub use controller::TradingIterationController;
pub use error::EngineError;
pub use position::PositionState;
pub use reconciler::{ReconcileOutcome, StateReconciler};
pub use session::{CycleReport, TradingSession};
