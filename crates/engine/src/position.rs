use core_types::Instrument;
use risk::RiskThresholds;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Flat,
    Open { thresholds: RiskThresholds },
}

/// Whether one instrument is held, at what assumed entry price, and how many entries
/// the current holding took.
///
/// Entry price and thresholds live inside the `Open` phase, so "open", "has an entry
/// price" and "has thresholds" cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionState {
    instrument: Instrument,
    phase: Phase,
    order_count: u32,
}

impl PositionState {
    /// A flat position, as at the start of a run.
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            phase: Phase::Flat,
            order_count: 0,
        }
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase, Phase::Open { .. })
    }

    pub fn entry_price(&self) -> Option<Decimal> {
        self.thresholds().map(RiskThresholds::entry_price)
    }

    pub fn thresholds(&self) -> Option<&RiskThresholds> {
        match &self.phase {
            Phase::Open { thresholds } => Some(thresholds),
            Phase::Flat => None,
        }
    }

    pub fn order_count(&self) -> u32 {
        self.order_count
    }

    /// FLAT -> OPEN. The entry price is the one the thresholds were derived from.
    ///
    /// # Panics
    ///
    /// Opening an already open position is a logic error in the caller.
    pub fn open(&mut self, thresholds: RiskThresholds) {
        assert!(
            !self.is_open(),
            "attempted to open {} while a position is already open",
            self.instrument
        );
        self.phase = Phase::Open { thresholds };
        self.order_count += 1;
    }

    /// OPEN -> FLAT, returning the thresholds that were in force. Closing a flat
    /// position is a no-op.
    pub fn close(&mut self) -> Option<RiskThresholds> {
        let previous = self.thresholds().copied();
        self.phase = Phase::Flat;
        self.order_count = 0;
        previous
    }
}
