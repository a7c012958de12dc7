use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::Instrument;
use engine::{CycleReport, TradingSession};
use executor::PaperBroker;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;

/// One row of a replayed price file: `timestamp,symbol,price`.
#[derive(Debug, Deserialize)]
pub struct PriceRow {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub cycles: u64,
    pub sessions_closed: u64,
    pub orders: usize,
    pub failures: usize,
    pub skipped: usize,
}

impl ReplaySummary {
    fn absorb(&mut self, report: &CycleReport) {
        self.orders += report.orders().count();
        self.failures += report.failures.len();
        self.skipped += report.skipped.len();
    }
}

/// Feeds a price file through `session`.
///
/// Rows sharing a timestamp form one cycle. Before each cycle every quote is
/// cleared, so an instrument without a row at that timestamp is skipped rather
/// than fed a stale price. The session is closed whenever the trading date changes
/// and once more at the end of the file; each instrument's last seen price is
/// quoted again for that close so open positions can always be flattened.
pub fn replay<R: Read>(
    reader: R,
    session: &mut TradingSession<PaperBroker>,
    pause: Option<Duration>,
) -> anyhow::Result<ReplaySummary> {
    let mut replayer = Replayer::new(session);
    let mut rows = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut batch: Vec<PriceRow> = Vec::new();

    for (line, row) in rows.deserialize::<PriceRow>().enumerate() {
        // Header is line 1.
        let row = row.with_context(|| format!("invalid price row at line {}", line + 2))?;
        if batch.first().is_some_and(|first| first.timestamp != row.timestamp) {
            replayer.run_batch(&mut batch);
            if let Some(pause) = pause {
                std::thread::sleep(pause);
            }
        }
        batch.push(row);
    }
    replayer.run_batch(&mut batch);
    if replayer.session_date.is_some() {
        replayer.close();
    }

    Ok(replayer.summary)
}

struct Replayer<'a> {
    session: &'a mut TradingSession<PaperBroker>,
    instruments: Vec<Instrument>,
    last_quotes: HashMap<Instrument, f64>,
    session_date: Option<NaiveDate>,
    summary: ReplaySummary,
}

impl<'a> Replayer<'a> {
    fn new(session: &'a mut TradingSession<PaperBroker>) -> Self {
        let instruments = session.controller().instruments().cloned().collect();
        Self {
            session,
            instruments,
            last_quotes: HashMap::new(),
            session_date: None,
            summary: ReplaySummary::default(),
        }
    }

    fn run_batch(&mut self, batch: &mut Vec<PriceRow>) {
        let Some(timestamp) = batch.first().map(|row| row.timestamp) else {
            return;
        };
        let date = timestamp.date_naive();
        if self.session_date.is_some_and(|current| current != date) {
            self.close();
        }
        self.session_date = Some(date);

        let broker = self.session.broker_mut();
        for instrument in &self.instruments {
            broker.clear_quote(instrument);
        }
        for row in batch.drain(..) {
            let instrument = Instrument::new(row.symbol.trim());
            if !self.instruments.contains(&instrument) {
                tracing::debug!(%instrument, "Ignoring price for an instrument with no bot.");
                continue;
            }
            broker.set_quote(&instrument, row.price);
            self.last_quotes.insert(instrument, row.price);
        }

        tracing::debug!(%timestamp, "Replaying cycle.");
        let report = self.session.run_cycle();
        self.summary.cycles += 1;
        self.summary.absorb(&report);
    }

    fn close(&mut self) {
        let broker = self.session.broker_mut();
        for (instrument, price) in &self.last_quotes {
            broker.set_quote(instrument, *price);
        }
        let report = self.session.close_session();
        self.summary.sessions_closed += 1;
        self.summary.absorb(&report);
    }
}
