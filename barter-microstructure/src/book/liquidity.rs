use crate::model::{BookSide, OrderBookSnapshot};
use serde::{Deserialize, Serialize};

/// Band around mid, in percent, over which near-touch depth is measured.
pub const VACUUM_BAND_PCT: f64 = 0.5;

/// Levels counted as the touch.
const TOUCH_LEVELS: usize = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VacuumLevel {
    /// Liquidity sits at the touch.
    Concentrated,
    SpreadThin,
    /// Little liquidity at the touch relative to the band, price moves easily.
    Vacuum,
}

impl VacuumLevel {
    pub fn from_lvi(lvi: f64) -> Self {
        if lvi >= 0.7 {
            VacuumLevel::Vacuum
        } else if lvi >= 0.5 {
            VacuumLevel::SpreadThin
        } else {
            VacuumLevel::Concentrated
        }
    }
}

/// Liquidity vacuum index per side.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LiquidityVacuum {
    pub lvi_bid: f64,
    pub lvi_ask: f64,
    pub bid_level: VacuumLevel,
    pub ask_level: VacuumLevel,
}

impl LiquidityVacuum {
    pub fn compute(book: &OrderBookSnapshot, mid: f64) -> Self {
        let lvi_bid = lvi(book, BookSide::Bid, mid);
        let lvi_ask = lvi(book, BookSide::Ask, mid);

        Self {
            lvi_bid,
            lvi_ask,
            bid_level: VacuumLevel::from_lvi(lvi_bid),
            ask_level: VacuumLevel::from_lvi(lvi_ask),
        }
    }
}

/// `1 - touch depth / band depth` clamped to `[0, 1]`, 1.0 when the band is empty.
pub fn lvi(book: &OrderBookSnapshot, side: BookSide, mid: f64) -> f64 {
    let touch = book.depth_top(side, TOUCH_LEVELS);
    let band = book.depth_within_pct(side, mid, VACUUM_BAND_PCT);

    if band > 0.0 {
        (1.0 - touch / band).clamp(0.0, 1.0)
    } else {
        1.0
    }
}
