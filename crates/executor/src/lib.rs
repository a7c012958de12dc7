//! # Swingline Executor Crate
//!
//! The boundary between the decision core and the outside world. It defines the
//! collaborator traits the engine talks to (`PriceSource`, `PositionOracle`,
//! `OrderSink`, `AccountSource`) and provides `PaperBroker`, an in-memory
//! implementation of all four for replays and tests.
//!
//! ## Architectural Principles
//!
//! - **Synchronous calls:** the core is step-driven; every collaborator call has
//!   already resolved by the time the engine looks at its result.
//! - **Execution abstraction:** the engine is agnostic about whether decisions go to
//!   the paper broker or to a real one.

pub mod broker;
pub mod error;
pub mod paper;

pub use broker::{AccountSource, Broker, OrderSink, PositionOracle, PriceSource};
pub use error::BrokerError;
pub use paper::PaperBroker;
