use crate::model::{Direction, InstrumentId, Side, Trade};
use fnv::FnvHashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Running cumulative volume delta for one instrument.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CvdTotals {
    pub delta_base: f64,
    pub delta_quote: f64,
}

/// Process-lifetime CVD accumulators, one per instrument.
#[derive(Debug, Default)]
pub struct CvdTracker {
    totals: RwLock<FnvHashMap<InstrumentId, Arc<Mutex<CvdTotals>>>>,
}

impl CvdTracker {
    fn totals(&self, instrument: &InstrumentId) -> Arc<Mutex<CvdTotals>> {
        if let Some(totals) = self.totals.read().get(instrument) {
            return Arc::clone(totals);
        }

        Arc::clone(
            self.totals
                .write()
                .entry(instrument.clone())
                .or_insert_with(Default::default),
        )
    }

    /// Current totals, zero if the instrument has never been seen.
    pub fn get(&self, instrument: &InstrumentId) -> CvdTotals {
        self.totals
            .read()
            .get(instrument)
            .map(|totals| *totals.lock())
            .unwrap_or_default()
    }

    /// Add the signed volume of `trades` to the instrument's running totals.
    ///
    /// Returns the totals before and after the update.
    pub fn apply(&self, instrument: &InstrumentId, trades: &[Trade]) -> (CvdTotals, CvdTotals) {
        let totals = self.totals(instrument);
        let mut totals = totals.lock();
        let previous = *totals;

        for trade in trades {
            let signed_base = trade.signed_quantity();
            totals.delta_base += signed_base;
            totals.delta_quote += signed_base * trade.price_f64();
        }

        (previous, *totals)
    }
}

/// Cumulative volume delta after applying one trade tape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CvdReport {
    /// Running base-currency delta since tracking began.
    pub value: f64,
    /// Running quote-currency delta since tracking began.
    pub value_quote: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    /// Buy minus sell volume of this tape only.
    pub net_volume: f64,
    pub trend: Direction,
    pub interpretation: String,
}

impl CvdReport {
    pub fn compute(tracker: &CvdTracker, instrument: &InstrumentId, trades: &[Trade]) -> Self {
        let (buy_volume, sell_volume) = side_volumes(trades);
        let (_, totals) = tracker.apply(instrument, trades);

        Self {
            value: totals.delta_base,
            value_quote: totals.delta_quote,
            buy_volume,
            sell_volume,
            net_volume: buy_volume - sell_volume,
            trend: Direction::from_volumes(buy_volume, sell_volume, 1.2),
            interpretation: interpret(totals.delta_base, buy_volume, sell_volume).to_string(),
        }
    }

    /// Report for an empty tape, carrying the instrument's existing totals.
    pub fn empty(totals: CvdTotals) -> Self {
        Self {
            value: totals.delta_base,
            value_quote: totals.delta_quote,
            buy_volume: 0.0,
            sell_volume: 0.0,
            net_volume: 0.0,
            trend: Direction::Neutral,
            interpretation: "No trades data available".to_string(),
        }
    }
}

/// Total buy and sell volume of a slice of trades.
pub fn side_volumes(trades: &[Trade]) -> (f64, f64) {
    trades
        .iter()
        .fold((0.0, 0.0), |(buy, sell), trade| match trade.side {
            Side::Buy => (buy + trade.quantity_f64(), sell),
            Side::Sell => (buy, sell + trade.quantity_f64()),
        })
}

fn interpret(cvd: f64, buy_volume: f64, sell_volume: f64) -> &'static str {
    if cvd > 0.0 && buy_volume > sell_volume * 1.5 {
        "Strong net buying pressure, CVD trending up"
    } else if cvd > 0.0 {
        "Positive CVD, more buying than selling"
    } else if cvd < 0.0 && sell_volume > buy_volume * 1.5 {
        "Strong net selling pressure, CVD trending down"
    } else if cvd < 0.0 {
        "Negative CVD, more selling than buying"
    } else {
        "Balanced CVD"
    }
}
