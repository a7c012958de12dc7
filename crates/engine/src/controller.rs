use crate::error::EngineError;
use crate::position::PositionState;
use crate::reconciler::{ReconcileOutcome, StateReconciler};
use configuration::Config;
use core_types::{Decision, ExitReason, Instrument, PositionHandle, StrategyId};
use executor::AccountSource;
use risk::{RiskManager, RiskParameters};
use std::collections::BTreeMap;
use strategies::{PriceHistory, Strategy};

/// Everything the controller keeps for one instrument. Nothing here is shared
/// with another slot.
struct InstrumentSlot {
    history: PriceHistory,
    position: PositionState,
    strategy: Box<dyn Strategy>,
}

/// Runs one evaluation step per instrument: record the price, check exits while a
/// position is open, otherwise ask the strategy for an entry and size it.
///
/// The controller only decides. Orders are submitted by the caller, which rolls the
/// position back with `restore_position` if the submission fails.
pub struct TradingIterationController {
    params: RiskParameters,
    risk_manager: Box<dyn RiskManager>,
    reconciler: StateReconciler,
    history_capacity: Option<usize>,
    slots: BTreeMap<Instrument, InstrumentSlot>,
}

impl TradingIterationController {
    pub fn new(
        params: RiskParameters,
        risk_manager: Box<dyn RiskManager>,
        history_capacity: Option<usize>,
    ) -> Self {
        Self {
            params,
            risk_manager,
            reconciler: StateReconciler::new(params),
            history_capacity,
            slots: BTreeMap::new(),
        }
    }

    /// Builds a controller with one fresh strategy per enabled bot.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        let params = RiskParameters::try_from(&config.risk_management)?;
        let enabled = config.enabled_bots().count();
        let risk_manager = risk::create_risk_manager(&config.risk_management.sizing, enabled)?;

        let mut controller = Self::new(params, risk_manager, config.engine.history_capacity);
        for bot in config.enabled_bots() {
            let instrument: Instrument = bot.symbol.parse()?;
            let strategy = strategies::create_strategy(bot.strategy_id, instrument.as_str())?;
            controller.add_instrument(instrument, strategy)?;
        }
        tracing::info!(
            instruments = controller.slots.len(),
            stop_loss_pct = %params.stop_loss_pct(),
            take_profit_pct = %params.take_profit_pct(),
            "Trading controller initialized."
        );
        Ok(controller)
    }

    /// Registers an instrument with an empty history and a FLAT position.
    pub fn add_instrument(
        &mut self,
        instrument: Instrument,
        strategy: Box<dyn Strategy>,
    ) -> Result<(), EngineError> {
        if self.slots.contains_key(&instrument) {
            return Err(EngineError::DuplicateInstrument(instrument));
        }
        let slot = InstrumentSlot {
            history: PriceHistory::with_capacity_limit(self.history_capacity),
            position: PositionState::new(instrument.clone()),
            strategy,
        };
        self.slots.insert(instrument, slot);
        Ok(())
    }

    /// Registered instruments, in symbol order.
    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.slots.keys()
    }

    pub fn position(&self, instrument: &Instrument) -> Result<&PositionState, EngineError> {
        Ok(&self.slot(instrument)?.position)
    }

    pub fn history(&self, instrument: &Instrument) -> Result<&PriceHistory, EngineError> {
        Ok(&self.slot(instrument)?.history)
    }

    pub fn strategy_id(&self, instrument: &Instrument) -> Result<StrategyId, EngineError> {
        Ok(self.slot(instrument)?.strategy.id())
    }

    pub fn flattens_at_session_end(&self, instrument: &Instrument) -> Result<bool, EngineError> {
        Ok(self.slot(instrument)?.strategy.flattens_at_session_end())
    }

    /// Puts back a position snapshot taken before a step whose order was not accepted.
    pub fn restore_position(
        &mut self,
        instrument: &Instrument,
        snapshot: PositionState,
    ) -> Result<(), EngineError> {
        let slot = self.slot_mut(instrument)?;
        tracing::warn!(
            %instrument,
            was_open = slot.position.is_open(),
            restored_open = snapshot.is_open(),
            "Rolling back position state."
        );
        slot.position = snapshot;
        Ok(())
    }

    /// Aligns the local position with what the broker reports.
    pub fn reconcile(
        &mut self,
        instrument: &Instrument,
        broker_position: Option<&PositionHandle>,
    ) -> Result<ReconcileOutcome, EngineError> {
        let reconciler = self.reconciler;
        let slot = self.slot_mut(instrument)?;
        let outcome = reconciler.reconcile(&mut slot.position, broker_position)?;
        if outcome == ReconcileOutcome::Adopted {
            // The broker already holds the entry this strategy would have made.
            slot.strategy.mark_entry_attempted();
        }
        Ok(outcome)
    }

    /// Marks the strategy's entry as taken once its `EnterLong` has been accepted by
    /// the order sink. Callers that drive the controller directly must call this
    /// after a successful submission; a refused order leaves the strategy free to
    /// signal again.
    pub fn confirm_entry(&mut self, instrument: &Instrument) -> Result<(), EngineError> {
        self.slot_mut(instrument)?.strategy.mark_entry_attempted();
        Ok(())
    }

    /// One evaluation step for `instrument` at `new_price`.
    ///
    /// An invalid price, or a failure to read cash while flat, is reported before
    /// the sample is recorded, so history and position are left as they were. A
    /// sizing or threshold error after that keeps the sample but never touches the
    /// position.
    pub fn run_iteration(
        &mut self,
        instrument: &Instrument,
        new_price: f64,
        account: &dyn AccountSource,
    ) -> Result<Decision, EngineError> {
        let params = self.params;
        let slots = &mut self.slots;
        let slot = slots
            .get_mut(instrument)
            .ok_or_else(|| EngineError::UnknownInstrument(instrument.clone()))?;

        // Cash is only needed for an entry, which can only happen while flat.
        let cash = if slot.position.is_open() {
            None
        } else {
            Some(account.get_cash()?)
        };
        let price = slot.history.append(new_price)?;

        if let Some(thresholds) = slot.position.thresholds().copied() {
            if !slot.strategy.manages_exits() {
                return Ok(Decision::NoAction);
            }
            let Some(reason) = thresholds.breach(price) else {
                tracing::debug!(
                    %instrument,
                    %price,
                    stop_loss = %thresholds.stop_loss_price(),
                    take_profit = %thresholds.take_profit_price(),
                    "Position open, thresholds intact."
                );
                return Ok(Decision::NoAction);
            };
            slot.position.close();
            log_exit(instrument, reason, price, thresholds.entry_price());
            return Ok(Decision::ExitAll {
                instrument: instrument.clone(),
            });
        }

        let Some(signal) = slot.strategy.evaluate(&slot.history)? else {
            return Ok(Decision::NoAction);
        };

        let entry_price = params.assumed_fill_price(signal.trigger_price)?;
        let thresholds = params.thresholds_for(entry_price)?;
        let cash = cash.unwrap_or_default();
        let quantity = self.risk_manager.size_entry(entry_price, cash)?;

        if quantity == 0 {
            // An unfundable entry still uses up a one-shot strategy's signal.
            slot.strategy.mark_entry_attempted();
            tracing::info!(
                %instrument,
                %entry_price,
                %cash,
                "Entry signal ignored: insufficient funds."
            );
            return Ok(Decision::NoAction);
        }

        slot.position.open(thresholds);
        tracing::info!(
            %instrument,
            strategy = %slot.strategy.id(),
            quantity,
            %entry_price,
            stop_loss = %thresholds.stop_loss_price(),
            take_profit = %thresholds.take_profit_price(),
            order_count = slot.position.order_count(),
            "Buy order decided."
        );
        Ok(Decision::EnterLong {
            instrument: instrument.clone(),
            quantity,
        })
    }

    /// Forced end-of-session closure: any open position is closed regardless of
    /// where the price stands relative to its thresholds.
    pub fn run_session_close(&mut self, instrument: &Instrument) -> Result<Decision, EngineError> {
        let slot = self.slot_mut(instrument)?;
        match slot.position.close() {
            Some(thresholds) => {
                let last = slot.history.latest().unwrap_or(thresholds.entry_price());
                log_exit(instrument, ExitReason::SessionEnd, last, thresholds.entry_price());
                Ok(Decision::ExitAll {
                    instrument: instrument.clone(),
                })
            }
            None => Ok(Decision::NoAction),
        }
    }

    fn slot(&self, instrument: &Instrument) -> Result<&InstrumentSlot, EngineError> {
        self.slots
            .get(instrument)
            .ok_or_else(|| EngineError::UnknownInstrument(instrument.clone()))
    }

    fn slot_mut(&mut self, instrument: &Instrument) -> Result<&mut InstrumentSlot, EngineError> {
        self.slots
            .get_mut(instrument)
            .ok_or_else(|| EngineError::UnknownInstrument(instrument.clone()))
    }
}

fn log_exit(
    instrument: &Instrument,
    reason: ExitReason,
    price: rust_decimal::Decimal,
    entry_price: rust_decimal::Decimal,
) {
    tracing::info!(
        %instrument,
        %reason,
        %price,
        %entry_price,
        "Sell order decided. Position closed."
    );
}
