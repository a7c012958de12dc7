use crate::error::StrategyError;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::collections::VecDeque;

/// Append-only record of the prices observed for one instrument.
///
/// Samples are kept in arrival order and are never reordered or edited. By default the
/// history grows without bound; `with_capacity_limit` keeps only the most recent N,
/// dropping the oldest sample on each append past the limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    samples: VecDeque<Decimal>,
    capacity_limit: Option<usize>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(capacity_limit: Option<usize>) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity_limit.unwrap_or(64)),
            capacity_limit,
        }
    }

    /// Records a new sample and returns it as a `Decimal`.
    ///
    /// NaN, infinities, zero and negative prices are rejected and leave the history
    /// untouched.
    pub fn append(&mut self, price: f64) -> Result<Decimal, StrategyError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(StrategyError::InvalidPrice { price });
        }
        // Values outside Decimal's range, or so small they round to zero, are rejected too.
        let sample = Decimal::from_f64(price)
            .filter(|sample| *sample > Decimal::ZERO)
            .ok_or(StrategyError::InvalidPrice { price })?;

        self.samples.push_back(sample);
        if let Some(limit) = self.capacity_limit {
            while self.samples.len() > limit {
                self.samples.pop_front();
            }
        }
        Ok(sample)
    }

    /// Returns the most recent `n` samples, oldest first.
    pub fn last(&self, n: usize) -> Result<Vec<Decimal>, StrategyError> {
        let available = self.samples.len();
        if available < n {
            return Err(StrategyError::InsufficientHistory {
                requested: n,
                available,
            });
        }
        Ok(self.samples.iter().skip(available - n).copied().collect())
    }

    pub fn latest(&self) -> Option<Decimal> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The recorded samples as `f64`, oldest first, for indicator libraries that
    /// work on floats.
    pub fn to_f64_series(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|sample| sample.to_f64()).collect()
    }
}
