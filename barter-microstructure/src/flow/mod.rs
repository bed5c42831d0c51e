//! Trade tape analytics: cumulative volume delta, order flow imbalance, Kyle's lambda and
//! aggressor pressure.

use crate::{
    config::EngineConfig,
    error::MicrostructureError,
    model::{Direction, InstrumentId, TradeTape},
    stats::{RollingStatTracker, ZScore},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Process-lifetime cumulative volume delta per instrument.
pub mod cvd;

/// Kyle's lambda price impact estimation.
pub mod kyle;

/// Windowed order flow imbalance and its z-score.
pub mod ofi;

/// Buy/sell ratios, aggressive pressure and recent trade summary.
pub mod pressure;

pub use cvd::{CvdReport, CvdTotals, CvdTracker};
pub use kyle::{KyleLambda, PriceImpact};
pub use ofi::{OfiReport, OfiSignal};
pub use pressure::{AggressivePressure, BuySellRatio, PressureLevel, RecentTradeSummary};

/// Everything derived from a non-empty trade tape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeFlow {
    pub total_trades: usize,
    pub cvd: CvdReport,
    pub ofi: OfiReport,
    pub buy_sell_ratio: BuySellRatio,
    pub aggressive: AggressivePressure,
    pub kyle_lambda: KyleLambda,
    pub recent: Option<RecentTradeSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeFlowReport {
    /// No parseable trades. CVD carries the instrument's unchanged running totals.
    Empty { cvd: CvdReport, ofi: OfiReport },
    Populated(TradeFlow),
}

impl TradeFlowReport {
    pub fn ofi_zscore(&self) -> ZScore {
        match self {
            TradeFlowReport::Empty { ofi, .. } => ofi.zscore,
            TradeFlowReport::Populated(flow) => flow.ofi.zscore,
        }
    }

    pub fn cvd(&self) -> &CvdReport {
        match self {
            TradeFlowReport::Empty { cvd, .. } => cvd,
            TradeFlowReport::Populated(flow) => &flow.cvd,
        }
    }

    pub fn cvd_trend(&self) -> Direction {
        self.cvd().trend
    }

    pub fn kyle_lambda(&self) -> Option<&KyleLambda> {
        match self {
            TradeFlowReport::Empty { .. } => None,
            TradeFlowReport::Populated(flow) => Some(&flow.kyle_lambda),
        }
    }

    pub fn total_trades(&self) -> usize {
        match self {
            TradeFlowReport::Empty { .. } => 0,
            TradeFlowReport::Populated(flow) => flow.total_trades,
        }
    }
}

/// Trade flow analyzer with injected per-instrument state.
#[derive(Debug, Clone)]
pub struct TradeFlowAnalyzer {
    stats: Arc<RollingStatTracker>,
    cvd: Arc<CvdTracker>,
    ofi_window: usize,
    kyle_window: usize,
    aggressive_window: usize,
}

impl TradeFlowAnalyzer {
    pub fn new(config: &EngineConfig, stats: Arc<RollingStatTracker>, cvd: Arc<CvdTracker>) -> Self {
        Self {
            stats,
            cvd,
            ofi_window: config.ofi_window,
            kyle_window: config.kyle_window,
            aggressive_window: config.aggressive_window,
        }
    }

    pub fn analyze(
        &self,
        instrument: &InstrumentId,
        tape: &TradeTape,
    ) -> Result<TradeFlowReport, MicrostructureError> {
        if tape.is_empty() {
            debug!(%instrument, "empty trade tape, reporting neutral trade flow");
            return Ok(TradeFlowReport::Empty {
                cvd: CvdReport::empty(self.cvd.get(instrument)),
                ofi: OfiReport::empty(self.ofi_window),
            });
        }

        let trades = tape.trades();
        let recent = tape.recent(self.aggressive_window);

        Ok(TradeFlowReport::Populated(TradeFlow {
            total_trades: trades.len(),
            cvd: CvdReport::compute(&self.cvd, instrument, trades),
            ofi: OfiReport::compute(&self.stats, instrument, trades, self.ofi_window),
            buy_sell_ratio: BuySellRatio::compute(trades),
            aggressive: AggressivePressure::compute(recent),
            kyle_lambda: KyleLambda::estimate(trades, self.kyle_window)?,
            recent: RecentTradeSummary::compute(recent),
        }))
    }
}
