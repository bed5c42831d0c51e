//! Order book analytics: microprice, multi-level imbalance, depth ratio, liquidity vacuum,
//! spread regime and stop-cascade risk.
//!
//! Analysis requires both sides of the book. Crossed books are analysed, flagged with
//! `crossed = true`, and report zero micro-skew.

use crate::{
    error::MicrostructureError,
    model::{InstrumentId, OrderBookSnapshot},
    stats::{RollingStatTracker, ZScore},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Depth ratio near mid and its z-score.
pub mod depth;

/// Multi-level order book imbalance.
pub mod imbalance;

/// Liquidity vacuum index.
pub mod liquidity;

/// Microprice and micro-skew.
pub mod microprice;

/// Spread percentage and its z-score.
pub mod spread;

/// Stop risk index proxy.
pub mod stop_risk;

pub use depth::{DepthRatio, DepthRatioReport};
pub use imbalance::{ImbalanceSignal, OrderBookImbalance};
pub use liquidity::{LiquidityVacuum, VacuumLevel};
pub use microprice::{Microprice, SkewSignal};
pub use spread::{SpreadRegime, SpreadReport};
pub use stop_risk::{CascadeRisk, StopRisk};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    EmptyBook,
    MissingBids,
    MissingAsks,
    /// The analyzer hit degenerate arithmetic and reported neutral values instead.
    Degenerate,
}

/// Every order book metric for one snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderBookMetrics {
    pub crossed: bool,
    pub microprice: Microprice,
    pub imbalance: OrderBookImbalance,
    pub depth_ratio: DepthRatioReport,
    pub liquidity_vacuum: LiquidityVacuum,
    pub spread: SpreadReport,
    pub stop_risk: StopRisk,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderBookReport {
    Unavailable { reason: UnavailableReason },
    Available(OrderBookMetrics),
}

impl OrderBookReport {
    pub fn metrics(&self) -> Option<&OrderBookMetrics> {
        match self {
            OrderBookReport::Unavailable { .. } => None,
            OrderBookReport::Available(metrics) => Some(metrics),
        }
    }

    pub fn micro_skew(&self) -> f64 {
        self.metrics()
            .map(|metrics| metrics.microprice.micro_skew)
            .unwrap_or(0.0)
    }

    pub fn obi_5(&self) -> f64 {
        self.metrics()
            .map(|metrics| metrics.imbalance.obi_5)
            .unwrap_or(0.0)
    }

    /// Depth term for the composite score, 0 when unavailable.
    pub fn depth_factor(&self) -> f64 {
        self.metrics()
            .map(|metrics| metrics.depth_ratio.pressure_factor())
            .unwrap_or(0.0)
    }

    pub fn spread_zscore(&self) -> ZScore {
        self.metrics()
            .map(|metrics| metrics.spread.zscore)
            .unwrap_or_default()
    }

    /// `(sri_buy, sri_sell)`, both 0 when unavailable.
    pub fn stop_risk(&self) -> (f64, f64) {
        self.metrics()
            .map(|metrics| (metrics.stop_risk.sri_buy, metrics.stop_risk.sri_sell))
            .unwrap_or((0.0, 0.0))
    }
}

/// Order book analyzer with injected rolling history.
#[derive(Debug, Clone)]
pub struct OrderBookAnalyzer {
    stats: Arc<RollingStatTracker>,
}

impl OrderBookAnalyzer {
    pub fn new(stats: Arc<RollingStatTracker>) -> Self {
        Self { stats }
    }

    pub fn analyze(
        &self,
        instrument: &InstrumentId,
        book: &OrderBookSnapshot,
    ) -> Result<OrderBookReport, MicrostructureError> {
        let reason = match (book.bids.is_empty(), book.asks.is_empty()) {
            (true, true) => Some(UnavailableReason::EmptyBook),
            (true, false) => Some(UnavailableReason::MissingBids),
            (false, true) => Some(UnavailableReason::MissingAsks),
            (false, false) => None,
        };
        if let Some(reason) = reason {
            debug!(%instrument, ?reason, "order book unavailable for analysis");
            return Ok(OrderBookReport::Unavailable { reason });
        }

        let Some(top) = book.top_of_book() else {
            return Ok(OrderBookReport::Unavailable {
                reason: UnavailableReason::EmptyBook,
            });
        };

        let crossed = top.is_crossed();
        if crossed {
            warn!(
                %instrument,
                bid = top.bid_price,
                ask = top.ask_price,
                "analysing crossed order book"
            );
        }

        let microprice = microprice::Microprice::compute(&top)?;
        let mid = microprice.mid;

        Ok(OrderBookReport::Available(OrderBookMetrics {
            crossed,
            imbalance: OrderBookImbalance::compute(book),
            depth_ratio: DepthRatioReport::compute(&self.stats, instrument, book, mid)?,
            liquidity_vacuum: LiquidityVacuum::compute(book, mid),
            spread: SpreadReport::compute(&self.stats, instrument, &top),
            stop_risk: StopRisk::compute(book, mid),
            microprice,
        }))
    }
}
