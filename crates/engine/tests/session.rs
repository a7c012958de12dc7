//! End-to-end cycles through `TradingSession` against the paper broker.
//!
//! Covers:
//! 1. Swing-high entry, threshold exit and session-end closure
//! 2. Reconciliation with the broker's position record
//! 3. Rollback when the order sink refuses a decision
//! 4. Per-instrument failure isolation and missing prices
//! 5. Buy-and-hold entry, retry after refusal and overnight hold

use configuration::config_from_toml;
use core_types::{Decision, Instrument, OrderSide, PositionHandle};
use engine::{TradingIterationController, TradingSession};
use executor::{
    AccountSource, BrokerError, OrderSink, PaperBroker, PositionOracle, PriceSource,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;

const SWING_HIGH_FIXED: &str = r#"
    [risk_management]
    stop_loss_pct = 0.5
    take_profit_pct = 1.5

    [risk_management.sizing]
    mode = "fixed"
    quantity = 10

    [[bots]]
    symbol = "GOOG"
    strategy_id = "swing_high"

    [[bots]]
    symbol = "AAPL"
    strategy_id = "swing_high"
"#;

const MIXED_EQUAL_WEIGHT: &str = r#"
    [risk_management]
    stop_loss_pct = 0.5
    take_profit_pct = 1.5

    [[bots]]
    symbol = "GOOG"
    strategy_id = "buy_and_hold"

    [[bots]]
    symbol = "AAPL"
    strategy_id = "swing_high"
"#;

fn goog() -> Instrument {
    Instrument::new("GOOG")
}

fn aapl() -> Instrument {
    Instrument::new("AAPL")
}

// ── Test broker ──────────────────────────────────────────────────────

/// Paper broker with switchable faults.
struct FlakyBroker {
    inner: PaperBroker,
    reject_orders: bool,
    broken_quotes: HashSet<Instrument>,
}

impl FlakyBroker {
    fn new(cash: Decimal) -> Self {
        Self {
            inner: PaperBroker::new(cash),
            reject_orders: false,
            broken_quotes: HashSet::new(),
        }
    }
}

impl PriceSource for FlakyBroker {
    fn get_last_price(&self, instrument: &Instrument) -> Result<Option<f64>, BrokerError> {
        if self.broken_quotes.contains(instrument) {
            return Err(BrokerError::PriceQuery {
                instrument: instrument.clone(),
                reason: "connection reset".to_string(),
            });
        }
        self.inner.get_last_price(instrument)
    }
}

impl PositionOracle for FlakyBroker {
    fn get_position(&self, instrument: &Instrument) -> Result<Option<PositionHandle>, BrokerError> {
        self.inner.get_position(instrument)
    }
}

impl OrderSink for FlakyBroker {
    fn submit(&mut self, decision: &Decision) -> Result<(), BrokerError> {
        if self.reject_orders {
            let instrument = decision.instrument().cloned().unwrap_or_else(goog);
            return Err(BrokerError::OrderRejected {
                instrument,
                reason: "market closed".to_string(),
            });
        }
        self.inner.submit(decision)
    }
}

impl AccountSource for FlakyBroker {
    fn get_cash(&self) -> Result<Decimal, BrokerError> {
        self.inner.get_cash()
    }

    fn get_portfolio_value(&self) -> Result<Decimal, BrokerError> {
        self.inner.get_portfolio_value()
    }
}

fn paper_session(toml: &str, cash: Decimal) -> TradingSession<PaperBroker> {
    let config = config_from_toml(toml).unwrap();
    let controller = TradingIterationController::from_config(&config).unwrap();
    TradingSession::new(controller, PaperBroker::new(cash))
}

fn flaky_session(toml: &str, cash: Decimal) -> TradingSession<FlakyBroker> {
    let config = config_from_toml(toml).unwrap();
    let controller = TradingIterationController::from_config(&config).unwrap();
    TradingSession::new(controller, FlakyBroker::new(cash))
}

/// Pushes one quote per instrument and runs a cycle.
fn tick<B, F>(session: &mut TradingSession<B>, mut quote: F, prices: &[(Instrument, f64)]) -> engine::CycleReport
where
    B: executor::Broker,
    F: FnMut(&mut B, &Instrument, f64),
{
    for (instrument, price) in prices {
        quote(session.broker_mut(), instrument, *price);
    }
    session.run_cycle()
}

fn paper_quote(broker: &mut PaperBroker, instrument: &Instrument, price: f64) {
    broker.set_quote(instrument, price);
}

fn flaky_quote(broker: &mut FlakyBroker, instrument: &Instrument, price: f64) {
    broker.inner.set_quote(instrument, price);
}

// ── 1. Swing-high lifecycle ──────────────────────────────────────────

#[test]
fn swing_high_enters_once_and_takes_profit() {
    let mut session = paper_session(SWING_HIGH_FIXED, dec!(100000));

    for price in [100.0, 105.0] {
        let report = tick(&mut session, paper_quote, &[(goog(), price)]);
        assert_eq!(report.orders().count(), 0);
    }
    let report = tick(&mut session, paper_quote, &[(goog(), 110.0)]);
    assert_eq!(
        report.decision_for(&goog()),
        Some(&Decision::EnterLong { instrument: goog(), quantity: 10 })
    );

    // The pattern keeps firing while open; no second entry.
    let report = tick(&mut session, paper_quote, &[(goog(), 111.0)]);
    assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));
    assert_eq!(session.controller().position(&goog()).unwrap().order_count(), 1);

    // 111.65 is the take-profit level.
    let report = tick(&mut session, paper_quote, &[(goog(), 111.65)]);
    assert_eq!(report.decision_for(&goog()), Some(&Decision::ExitAll { instrument: goog() }));
    assert!(!session.controller().position(&goog()).unwrap().is_open());

    let sides: Vec<OrderSide> = session.broker().executions().iter().map(|e| e.side).collect();
    assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell]);
}

#[test]
fn session_close_flattens_inside_thresholds() {
    let mut session = paper_session(SWING_HIGH_FIXED, dec!(100000));
    for price in [100.0, 105.0, 110.0] {
        tick(&mut session, paper_quote, &[(goog(), price)]);
    }
    assert!(session.controller().position(&goog()).unwrap().is_open());

    let report = session.close_session();
    assert_eq!(report.decision_for(&goog()), Some(&Decision::ExitAll { instrument: goog() }));
    assert_eq!(report.decision_for(&aapl()), Some(&Decision::NoAction));
    assert!(!session.controller().position(&goog()).unwrap().is_open());
    assert_eq!(session.broker().position(&goog()), None);
    assert_eq!(session.broker().cash(), dec!(100000));
}

// ── 2. Reconciliation ────────────────────────────────────────────────

#[test]
fn externally_closed_position_is_cleared_without_an_order() {
    let mut session = paper_session(SWING_HIGH_FIXED, dec!(100000));
    for price in [100.0, 105.0, 110.0] {
        tick(&mut session, paper_quote, &[(goog(), price)]);
    }
    session.broker_mut().liquidate_externally(&goog()).unwrap();
    let executions_before = session.broker().executions().len();

    let report = tick(&mut session, paper_quote, &[(goog(), 109.6)]);
    assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));
    assert!(!session.controller().position(&goog()).unwrap().is_open());
    assert_eq!(session.broker().executions().len(), executions_before);
}

#[test]
fn session_close_skips_a_position_the_broker_already_closed() {
    let mut session = paper_session(SWING_HIGH_FIXED, dec!(100000));
    for price in [100.0, 105.0, 110.0] {
        tick(&mut session, paper_quote, &[(goog(), price)]);
    }
    session.broker_mut().liquidate_externally(&goog()).unwrap();
    let executions_before = session.broker().executions().len();

    let report = session.close_session();
    assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));
    assert_eq!(report.orders().count(), 0);
    assert!(report.failures.is_empty());
    assert!(!session.controller().position(&goog()).unwrap().is_open());
    assert_eq!(session.broker().executions().len(), executions_before);
}

#[test]
fn untracked_broker_position_blocks_a_second_entry() {
    let mut session = paper_session(SWING_HIGH_FIXED, dec!(100000));
    session
        .broker_mut()
        .open_external_position(&goog(), dec!(10), dec!(100));

    for price in [100.0, 100.2, 100.4] {
        let report = tick(&mut session, paper_quote, &[(goog(), price)]);
        assert_eq!(report.orders().count(), 0);
    }
    let position = session.controller().position(&goog()).unwrap();
    assert_eq!(position.entry_price(), Some(dec!(100)));
    assert_eq!(position.thresholds().unwrap().stop_loss_price(), dec!(99.5));
    assert_eq!(position.order_count(), 1);

    // The adopted position exits on its own thresholds.
    let report = tick(&mut session, paper_quote, &[(goog(), 99.4)]);
    assert_eq!(report.decision_for(&goog()), Some(&Decision::ExitAll { instrument: goog() }));
    assert_eq!(session.broker().position(&goog()), None);
}

// ── 3. Rollback ──────────────────────────────────────────────────────

#[test]
fn refused_entry_leaves_position_flat() {
    let mut session = flaky_session(SWING_HIGH_FIXED, dec!(100000));
    session.broker_mut().reject_orders = true;
    for price in [100.0, 105.0] {
        tick(&mut session, flaky_quote, &[(goog(), price)]);
    }

    let report = tick(&mut session, flaky_quote, &[(goog(), 110.0)]);
    assert_eq!(report.failures, vec![(goog(), "submit_order")]);
    let position = session.controller().position(&goog()).unwrap();
    assert!(!position.is_open());
    assert_eq!(position.order_count(), 0);

    // Once the broker accepts orders again the next rising sample enters.
    session.broker_mut().reject_orders = false;
    let report = tick(&mut session, flaky_quote, &[(goog(), 111.0)]);
    assert_eq!(
        report.decision_for(&goog()),
        Some(&Decision::EnterLong { instrument: goog(), quantity: 10 })
    );
}

#[test]
fn refused_session_close_keeps_position_open() {
    let mut session = flaky_session(SWING_HIGH_FIXED, dec!(100000));
    for price in [100.0, 105.0, 110.0] {
        tick(&mut session, flaky_quote, &[(goog(), price)]);
    }
    session.broker_mut().reject_orders = true;

    let report = session.close_session();
    assert_eq!(report.failures, vec![(goog(), "submit_order")]);
    let position = session.controller().position(&goog()).unwrap();
    assert!(position.is_open());
    assert_eq!(position.entry_price(), Some(dec!(110)));
}

// ── 4. Isolation ─────────────────────────────────────────────────────

#[test]
fn failing_price_feed_does_not_affect_other_instruments() {
    let mut session = flaky_session(SWING_HIGH_FIXED, dec!(100000));
    session.broker_mut().broken_quotes.insert(aapl());

    let mut last = engine::CycleReport::default();
    for (g, a) in [(100.0, 50.0), (105.0, 51.0), (110.0, 52.0)] {
        last = tick(&mut session, flaky_quote, &[(goog(), g), (aapl(), a)]);
    }
    assert_eq!(last.failures, vec![(aapl(), "get_last_price")]);
    assert!(last.decision_for(&goog()).unwrap().is_actionable());
    assert!(session.controller().history(&aapl()).unwrap().is_empty());
    assert_eq!(session.controller().history(&goog()).unwrap().len(), 3);
}

#[test]
fn invalid_price_is_reported_and_isolated() {
    let mut session = paper_session(SWING_HIGH_FIXED, dec!(100000));
    tick(&mut session, paper_quote, &[(goog(), 100.0), (aapl(), 50.0)]);

    let report = tick(&mut session, paper_quote, &[(goog(), f64::NAN), (aapl(), 51.0)]);
    assert_eq!(report.failures, vec![(goog(), "append_price")]);
    assert_eq!(session.controller().history(&goog()).unwrap().len(), 1);
    assert_eq!(session.controller().history(&aapl()).unwrap().len(), 2);
}

#[test]
fn missing_price_skips_without_recording_a_sample() {
    let mut session = paper_session(SWING_HIGH_FIXED, dec!(100000));
    tick(&mut session, paper_quote, &[(goog(), 100.0), (aapl(), 50.0)]);
    session.broker_mut().clear_quote(&goog());

    let report = session.run_cycle();
    assert_eq!(report.skipped, vec![goog()]);
    assert!(report.failures.is_empty());
    assert_eq!(session.controller().history(&goog()).unwrap().len(), 1);
    assert_eq!(session.controller().history(&aapl()).unwrap().len(), 2);
    assert_eq!(session.cycles(), 2);
}

// ── 5. Buy-and-hold ──────────────────────────────────────────────────

#[test]
fn buy_and_hold_buys_once_and_holds_overnight() {
    let mut session = paper_session(MIXED_EQUAL_WEIGHT, dec!(100000));

    let report = tick(&mut session, paper_quote, &[(goog(), 2800.50), (aapl(), 150.75)]);
    // Half the cash at 2800.50 buys 17 whole units.
    assert_eq!(
        report.decision_for(&goog()),
        Some(&Decision::EnterLong { instrument: goog(), quantity: 17 })
    );
    assert_eq!(report.decision_for(&aapl()), Some(&Decision::NoAction));

    for price in [2790.0, 2700.0, 2900.0] {
        let report = tick(&mut session, paper_quote, &[(goog(), price), (aapl(), 150.0)]);
        assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));
    }

    let report = session.close_session();
    assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));
    assert!(session.controller().position(&goog()).unwrap().is_open());
    assert_eq!(session.broker().position(&goog()).unwrap().quantity, dec!(17));
    assert_eq!(session.broker().executions().len(), 1);
}

#[test]
fn buy_and_hold_retries_after_a_refused_order() {
    let mut session = flaky_session(MIXED_EQUAL_WEIGHT, dec!(100000));
    session.broker_mut().reject_orders = true;

    let report = tick(&mut session, flaky_quote, &[(goog(), 2800.50), (aapl(), 150.75)]);
    assert_eq!(report.failures, vec![(goog(), "submit_order")]);
    assert!(!session.controller().position(&goog()).unwrap().is_open());

    session.broker_mut().reject_orders = false;
    let report = tick(&mut session, flaky_quote, &[(goog(), 2800.50), (aapl(), 150.75)]);
    assert_eq!(
        report.decision_for(&goog()),
        Some(&Decision::EnterLong { instrument: goog(), quantity: 17 })
    );
    assert_eq!(session.broker().inner.executions().len(), 1);

    // Accepted, so the one-shot is spent.
    let report = tick(&mut session, flaky_quote, &[(goog(), 2700.0), (aapl(), 151.0)]);
    assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));
    assert_eq!(session.broker().inner.executions().len(), 1);
}

#[test]
fn buy_and_hold_does_not_retry_after_insufficient_funds() {
    let mut session = paper_session(MIXED_EQUAL_WEIGHT, dec!(1000));

    let report = tick(&mut session, paper_quote, &[(goog(), 2800.50), (aapl(), 150.0)]);
    assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));

    let report = tick(&mut session, paper_quote, &[(goog(), 10.0), (aapl(), 150.0)]);
    assert_eq!(report.decision_for(&goog()), Some(&Decision::NoAction));
    assert!(session.broker().executions().is_empty());
}
