use core_types::Instrument;
use thiserror::Error;

/// A failure reported by one of the external collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Price request for {instrument} failed: {reason}")]
    PriceQuery { instrument: Instrument, reason: String },

    #[error("Position query for {instrument} failed: {reason}")]
    PositionQuery { instrument: Instrument, reason: String },

    #[error("Order for {instrument} rejected: {reason}")]
    OrderRejected { instrument: Instrument, reason: String },

    #[error("Account query failed: {0}")]
    AccountQuery(String),
}

impl BrokerError {
    /// The collaborator call that failed, for log records.
    pub fn operation(&self) -> &'static str {
        match self {
            BrokerError::PriceQuery { .. } => "get_last_price",
            BrokerError::PositionQuery { .. } => "get_position",
            BrokerError::OrderRejected { .. } => "submit_order",
            BrokerError::AccountQuery(_) => "get_account",
        }
    }
}
