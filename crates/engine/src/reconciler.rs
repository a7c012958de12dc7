use crate::position::PositionState;
use core_types::{ExitReason, PositionHandle};
use risk::{RiskError, RiskParameters};

/// What a reconciliation pass changed in local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Local state and the broker agree.
    InSync,
    /// Local state said OPEN but the broker holds nothing. Local state is now FLAT.
    GhostCleared,
    /// The broker holds a position local state did not know about. Local state is now
    /// OPEN with thresholds derived from the broker's average entry price.
    Adopted,
}

/// The "source of truth auditor" for one instrument.
///
/// The broker's position record always wins. The reconciler only corrects local
/// state; it never emits an order.
#[derive(Debug, Clone, Copy)]
pub struct StateReconciler {
    params: RiskParameters,
}

impl StateReconciler {
    pub fn new(params: RiskParameters) -> Self {
        Self { params }
    }

    /// Aligns `position` with the broker's view of the same instrument.
    pub fn reconcile(
        &self,
        position: &mut PositionState,
        broker_position: Option<&PositionHandle>,
    ) -> Result<ReconcileOutcome, RiskError> {
        let held = broker_position.filter(|handle| handle.is_held());

        match (position.is_open(), held) {
            (true, None) => {
                let entry = position.entry_price();
                position.close();
                tracing::warn!(
                    instrument = %position.instrument(),
                    entry_price = ?entry,
                    reason = %ExitReason::BrokerFlat,
                    "Ghost position found! Local state shows a position but none exists at the broker. Clearing local state."
                );
                Ok(ReconcileOutcome::GhostCleared)
            }
            (false, Some(handle)) => {
                let thresholds = self.params.thresholds_for(handle.avg_entry_price)?;
                position.open(thresholds);
                tracing::warn!(
                    instrument = %position.instrument(),
                    quantity = %handle.quantity,
                    avg_entry_price = %handle.avg_entry_price,
                    stop_loss = %thresholds.stop_loss_price(),
                    take_profit = %thresholds.take_profit_price(),
                    "Un-tracked position found at the broker. Adopting it into local state."
                );
                Ok(ReconcileOutcome::Adopted)
            }
            (true, Some(handle)) => {
                if position.entry_price() != Some(handle.avg_entry_price) {
                    // Thresholds stay on the assumed entry; the fill price is only reported.
                    tracing::debug!(
                        instrument = %position.instrument(),
                        local_entry = ?position.entry_price(),
                        broker_entry = %handle.avg_entry_price,
                        "Entry price differs from the broker's average fill price."
                    );
                }
                Ok(ReconcileOutcome::InSync)
            }
            (false, None) => Ok(ReconcileOutcome::InSync),
        }
    }
}
