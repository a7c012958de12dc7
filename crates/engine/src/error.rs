use core_types::{CoreError, Instrument};
use executor::BrokerError;
use risk::RiskError;
use strategies::StrategyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] configuration::ConfigError),

    #[error("Invalid input: {0}")]
    Core(#[from] CoreError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Risk management error: {0}")]
    Risk(#[from] RiskError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Instrument '{0}' is not registered with the engine.")]
    UnknownInstrument(Instrument),

    #[error("Instrument '{0}' is registered more than once.")]
    DuplicateInstrument(Instrument),
}

impl EngineError {
    /// The operation that failed, for log records.
    pub fn operation(&self) -> &'static str {
        match self {
            EngineError::Configuration(_) | EngineError::Core(_) => "load_config",
            EngineError::Strategy(StrategyError::InvalidPrice { .. }) => "append_price",
            EngineError::Strategy(_) => "evaluate_strategy",
            EngineError::Risk(_) => "size_entry",
            EngineError::Broker(e) => e.operation(),
            EngineError::UnknownInstrument(_) | EngineError::DuplicateInstrument(_) => {
                "lookup_instrument"
            }
        }
    }
}
