use crate::{
    error::{MicrostructureError, ensure_finite},
    model::{BookSide, InstrumentId, OrderBookSnapshot},
    stats::{Metric, RollingStatTracker, ZScore},
};
use serde::{Deserialize, Serialize};

/// Band around mid, in percent, over which depth is compared.
pub const DEPTH_BAND_PCT: f64 = 1.0;

/// Bid depth over ask depth near mid.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepthRatio {
    Finite { dratio: f64, log_dratio: f64 },
    /// Bid depth with no ask depth inside the band.
    BidSaturated,
    /// Ask depth with no bid depth inside the band.
    AskSaturated,
}

impl DepthRatio {
    pub fn from_depths(bid: f64, ask: f64) -> Result<Self, MicrostructureError> {
        match (bid > 0.0, ask > 0.0) {
            (true, true) => {
                let dratio = ensure_finite("dratio", bid / ask)?;
                Ok(DepthRatio::Finite {
                    dratio,
                    log_dratio: ensure_finite("log_dratio", dratio.ln())?,
                })
            }
            (true, false) => Ok(DepthRatio::BidSaturated),
            (false, true) => Ok(DepthRatio::AskSaturated),
            (false, false) => Ok(DepthRatio::Finite {
                dratio: 1.0,
                log_dratio: 0.0,
            }),
        }
    }

    pub fn log_dratio(&self) -> Option<f64> {
        match self {
            DepthRatio::Finite { log_dratio, .. } => Some(*log_dratio),
            DepthRatio::BidSaturated | DepthRatio::AskSaturated => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DepthRatioReport {
    pub depth_bid: f64,
    pub depth_ask: f64,
    pub ratio: DepthRatio,
    /// Z-score of `log_dratio`. Neutral for saturated readings, which are never observed.
    pub zscore: ZScore,
}

impl DepthRatioReport {
    pub fn compute(
        tracker: &RollingStatTracker,
        instrument: &InstrumentId,
        book: &OrderBookSnapshot,
        mid: f64,
    ) -> Result<Self, MicrostructureError> {
        let depth_bid = book.depth_within_pct(BookSide::Bid, mid, DEPTH_BAND_PCT);
        let depth_ask = book.depth_within_pct(BookSide::Ask, mid, DEPTH_BAND_PCT);
        let ratio = DepthRatio::from_depths(depth_bid, depth_ask)?;

        let zscore = match ratio.log_dratio() {
            Some(log_dratio) => tracker.record(instrument, Metric::LogDepthRatio, log_dratio),
            None => ZScore::default(),
        };

        Ok(Self {
            depth_bid,
            depth_ask,
            ratio,
            zscore,
        })
    }

    /// Depth term in `[-1, 1]` for the composite pressure score.
    ///
    /// Finite ratios squash the z-score with `tanh(z / 2)`, saturated ratios pin to the
    /// bound of the side holding all the depth.
    pub fn pressure_factor(&self) -> f64 {
        match self.ratio {
            DepthRatio::Finite { .. } => (self.zscore.value / 2.0).tanh(),
            DepthRatio::BidSaturated => 1.0,
            DepthRatio::AskSaturated => -1.0,
        }
    }
}
