use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Rejected price sample {price}: prices must be finite and greater than zero")]
    InvalidPrice { price: f64 },

    #[error("Requested the last {requested} samples but only {available} are recorded")]
    InsufficientHistory { requested: usize, available: usize },
}
