use crate::controller::TradingIterationController;
use crate::error::EngineError;
use crate::position::PositionState;
use crate::reconciler::ReconcileOutcome;
use core_types::{Decision, Instrument};
use executor::Broker;

/// What happened to each instrument during one cycle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    /// Decisions accepted by the order sink, plus `NoAction`s.
    pub decisions: Vec<(Instrument, Decision)>,
    /// Instruments without a price this cycle.
    pub skipped: Vec<Instrument>,
    /// Instruments whose step failed, with the failing operation.
    pub failures: Vec<(Instrument, &'static str)>,
}

impl CycleReport {
    /// Actionable decisions that reached the order sink.
    pub fn orders(&self) -> impl Iterator<Item = &Decision> {
        self.decisions
            .iter()
            .map(|(_, decision)| decision)
            .filter(|decision| decision.is_actionable())
    }

    pub fn decision_for(&self, instrument: &Instrument) -> Option<&Decision> {
        self.decisions
            .iter()
            .find(|(candidate, _)| candidate == instrument)
            .map(|(_, decision)| decision)
    }
}

/// Drives every registered instrument through one step per cycle against a broker.
///
/// A failure on one instrument is logged and reported; it never stops the others.
pub struct TradingSession<B: Broker> {
    controller: TradingIterationController,
    broker: B,
    cycles: u64,
}

impl<B: Broker> TradingSession<B> {
    pub fn new(controller: TradingIterationController, broker: B) -> Self {
        Self {
            controller,
            broker,
            cycles: 0,
        }
    }

    pub fn controller(&self) -> &TradingIterationController {
        &self.controller
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Mutable access for hosts that push quotes into the broker between cycles.
    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One trading iteration across all instruments.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let span = tracing::info_span!("cycle", n = self.cycles);
        let _enter = span.enter();

        let mut report = CycleReport::default();
        let instruments: Vec<Instrument> = self.controller.instruments().cloned().collect();
        for instrument in instruments {
            match self.step(&instrument) {
                Ok(Some(decision)) => report.decisions.push((instrument, decision)),
                Ok(None) => report.skipped.push(instrument),
                Err(e) => {
                    tracing::error!(
                        %instrument,
                        operation = e.operation(),
                        error = %e,
                        "Trading iteration failed for instrument."
                    );
                    report.failures.push((instrument, e.operation()));
                }
            }
        }

        self.log_portfolio_value();
        report
    }

    /// End-of-session closure. Instruments whose strategy holds overnight are left
    /// alone.
    pub fn close_session(&mut self) -> CycleReport {
        let span = tracing::info_span!("session_close", after_cycle = self.cycles);
        let _enter = span.enter();

        let mut report = CycleReport::default();
        let instruments: Vec<Instrument> = self.controller.instruments().cloned().collect();
        for instrument in instruments {
            match self.close_one(&instrument) {
                Ok(decision) => report.decisions.push((instrument, decision)),
                Err(e) => {
                    tracing::error!(
                        %instrument,
                        operation = e.operation(),
                        error = %e,
                        "Session close failed for instrument."
                    );
                    report.failures.push((instrument, e.operation()));
                }
            }
        }

        self.log_portfolio_value();
        report
    }

    /// `Ok(None)` when no price was available.
    fn step(&mut self, instrument: &Instrument) -> Result<Option<Decision>, EngineError> {
        let Some(price) = self.broker.get_last_price(instrument)? else {
            tracing::warn!(%instrument, "No price available. Skipping instrument this cycle.");
            return Ok(None);
        };

        self.reconcile(instrument)?;

        let snapshot = self.controller.position(instrument)?.clone();
        let decision = self.controller.run_iteration(instrument, price, &self.broker)?;
        self.submit(instrument, decision, snapshot).map(Some)
    }

    fn close_one(&mut self, instrument: &Instrument) -> Result<Decision, EngineError> {
        if !self.controller.flattens_at_session_end(instrument)? {
            tracing::info!(%instrument, "Market is about to close. No action taken.");
            return Ok(Decision::NoAction);
        }
        // A position already closed at the broker needs no exit order.
        self.reconcile(instrument)?;
        let snapshot = self.controller.position(instrument)?.clone();
        let decision = self.controller.run_session_close(instrument)?;
        self.submit(instrument, decision, snapshot)
    }

    /// The broker's position record wins over local state.
    fn reconcile(&mut self, instrument: &Instrument) -> Result<ReconcileOutcome, EngineError> {
        let broker_position = self.broker.get_position(instrument)?;
        let outcome = self.controller.reconcile(instrument, broker_position.as_ref())?;
        if outcome != ReconcileOutcome::InSync {
            tracing::info!(%instrument, ?outcome, "Local position reconciled with broker.");
        }
        Ok(outcome)
    }

    /// Forwards an actionable decision; on rejection the position goes back to
    /// `snapshot` so local state never claims an order the broker refused.
    fn submit(
        &mut self,
        instrument: &Instrument,
        decision: Decision,
        snapshot: PositionState,
    ) -> Result<Decision, EngineError> {
        if !decision.is_actionable() {
            return Ok(decision);
        }
        if let Err(e) = self.broker.submit(&decision) {
            self.controller.restore_position(instrument, snapshot)?;
            return Err(e.into());
        }
        if matches!(decision, Decision::EnterLong { .. }) {
            self.controller.confirm_entry(instrument)?;
        }
        tracing::debug!(%instrument, ?decision, "Order accepted.");
        Ok(decision)
    }

    fn log_portfolio_value(&self) {
        match self.broker.get_portfolio_value() {
            Ok(value) => tracing::info!(portfolio_value = %value, "Current portfolio value."),
            Err(e) => tracing::warn!(
                operation = e.operation(),
                error = %e,
                "Could not read portfolio value."
            ),
        }
    }
}
