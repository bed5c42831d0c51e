use crate::{
    model::{InstrumentId, TopOfBook},
    stats::{Metric, RollingStatTracker, ZScore},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpreadRegime {
    /// Liquidity deteriorating.
    AbnormallyWide,
    Wide,
    #[default]
    Normal,
    Tight,
}

impl SpreadRegime {
    pub fn from_zscore(z: f64) -> Self {
        if z >= 1.5 {
            SpreadRegime::AbnormallyWide
        } else if z >= 1.0 {
            SpreadRegime::Wide
        } else if z <= -1.0 {
            SpreadRegime::Tight
        } else {
            SpreadRegime::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpreadReport {
    pub spread: f64,
    /// Spread as a percentage of mid, negative for crossed books.
    pub spread_pct: f64,
    pub zscore: ZScore,
    pub regime: SpreadRegime,
}

impl SpreadReport {
    pub fn compute(tracker: &RollingStatTracker, instrument: &InstrumentId, top: &TopOfBook) -> Self {
        let spread_pct = top.spread_pct();
        let zscore = tracker.record(instrument, Metric::SpreadPct, spread_pct);

        Self {
            spread: top.spread(),
            spread_pct,
            regime: SpreadRegime::from_zscore(zscore.value),
            zscore,
        }
    }
}
