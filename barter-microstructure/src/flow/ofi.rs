use crate::{
    model::{InstrumentId, Trade},
    stats::{Metric, RollingStatTracker, ZScore},
};
use serde::{Deserialize, Serialize};

/// Order flow imbalance signal bands on the OFI z-score.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfiSignal {
    ExtremeBuy,
    StrongBuy,
    #[default]
    Neutral,
    StrongSell,
    ExtremeSell,
}

impl OfiSignal {
    pub fn from_zscore(z: f64) -> Self {
        if z >= 1.5 {
            OfiSignal::ExtremeBuy
        } else if z >= 1.0 {
            OfiSignal::StrongBuy
        } else if z <= -1.5 {
            OfiSignal::ExtremeSell
        } else if z <= -1.0 {
            OfiSignal::StrongSell
        } else {
            OfiSignal::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OfiSignal::ExtremeBuy => "EXTREME_BUY",
            OfiSignal::StrongBuy => "STRONG_BUY",
            OfiSignal::Neutral => "NEUTRAL",
            OfiSignal::StrongSell => "STRONG_SELL",
            OfiSignal::ExtremeSell => "EXTREME_SELL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OfiReport {
    /// Signed volume of the most recent window.
    pub value: f64,
    pub zscore: ZScore,
    pub signal: OfiSignal,
    pub window: usize,
}

impl OfiReport {
    /// Compute per-trade window OFI values, feed all of them into the instrument's history
    /// and score the most recent one.
    pub fn compute(
        tracker: &RollingStatTracker,
        instrument: &InstrumentId,
        trades: &[Trade],
        window: usize,
    ) -> Self {
        let values = window_values(trades, window);
        let zscore = tracker.record_many(instrument, Metric::OrderFlowImbalance, &values);

        Self {
            value: values.last().copied().unwrap_or(0.0),
            signal: OfiSignal::from_zscore(zscore.value),
            zscore,
            window,
        }
    }

    pub fn empty(window: usize) -> Self {
        Self {
            value: 0.0,
            zscore: ZScore::default(),
            signal: OfiSignal::Neutral,
            window,
        }
    }
}

/// OFI ending at each trade: signed quantity summed over the trailing `window` trades.
///
/// Leading windows are partial until `window` trades are available.
pub fn window_values(trades: &[Trade], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let signed = trades.iter().map(Trade::signed_quantity).collect::<Vec<_>>();

    (0..signed.len())
        .map(|index| {
            let start = (index + 1).saturating_sub(window);
            signed[start..=index].iter().sum()
        })
        .collect()
}
