use super::cvd::side_volumes;
use crate::{model::Trade, stats::calc};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Buy versus sell activity over the whole tape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BuySellRatio {
    pub buy_count: usize,
    pub sell_count: usize,
    pub buy_pct: f64,
    pub sell_pct: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub buy_volume_pct: f64,
    pub sell_volume_pct: f64,
    /// `None` when there are buys but no sells.
    pub count_ratio: Option<f64>,
    /// `None` when there is buy volume but no sell volume.
    pub volume_ratio: Option<f64>,
}

impl BuySellRatio {
    pub fn compute(trades: &[Trade]) -> Self {
        let buy_count = trades.iter().filter(|trade| trade.side.is_buy()).count();
        let sell_count = trades.len() - buy_count;
        let (buy_volume, sell_volume) = side_volumes(trades);

        let buy_pct = share_pct(buy_count as f64, sell_count as f64);
        let buy_volume_pct = share_pct(buy_volume, sell_volume);

        Self {
            buy_count,
            sell_count,
            buy_pct,
            sell_pct: 100.0 - buy_pct,
            buy_volume,
            sell_volume,
            buy_volume_pct,
            sell_volume_pct: 100.0 - buy_volume_pct,
            count_ratio: ratio(buy_count as f64, sell_count as f64),
            volume_ratio: ratio(buy_volume, sell_volume),
        }
    }
}

/// Classification of aggressor pressure over the most recent trades.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PressureLevel {
    StrongBuyPressure,
    BuyPressure,
    #[default]
    Balanced,
    SellPressure,
    StrongSellPressure,
}

impl PressureLevel {
    pub fn from_pcts(buy_pct: f64, sell_pct: f64) -> Self {
        if buy_pct >= 65.0 {
            PressureLevel::StrongBuyPressure
        } else if buy_pct >= 55.0 {
            PressureLevel::BuyPressure
        } else if sell_pct >= 65.0 {
            PressureLevel::StrongSellPressure
        } else if sell_pct >= 55.0 {
            PressureLevel::SellPressure
        } else {
            PressureLevel::Balanced
        }
    }
}

/// Aggressor volume split over the most recent trades of the tape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AggressivePressure {
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub buy_pressure_pct: f64,
    pub sell_pressure_pct: f64,
    pub pressure: PressureLevel,
    pub trades: usize,
}

impl AggressivePressure {
    pub fn compute(recent: &[Trade]) -> Self {
        let (buy_volume, sell_volume) = side_volumes(recent);
        let buy_pressure_pct = share_pct(buy_volume, sell_volume);
        let sell_pressure_pct = 100.0 - buy_pressure_pct;

        Self {
            buy_volume,
            sell_volume,
            buy_pressure_pct,
            sell_pressure_pct,
            pressure: PressureLevel::from_pcts(buy_pressure_pct, sell_pressure_pct),
            trades: recent.len(),
        }
    }
}

/// Price summary of the most recent trades.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecentTradeSummary {
    pub count: usize,
    pub mean_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Sample standard deviation of price, 0 for a single trade.
    pub price_volatility: f64,
    pub first_price: f64,
    pub last_price: f64,
    pub first_time: Option<DateTime<Utc>>,
    pub last_time: Option<DateTime<Utc>>,
    pub price_change: f64,
    pub price_change_pct: f64,
}

impl RecentTradeSummary {
    pub fn compute(recent: &[Trade]) -> Option<Self> {
        let (first, last) = (recent.first()?, recent.last()?);
        let prices = recent.iter().map(Trade::price_f64).collect::<Vec<_>>();

        let first_price = first.price_f64();
        let last_price = last.price_f64();

        Some(Self {
            count: recent.len(),
            mean_price: calc::mean(&prices)?,
            min_price: prices.iter().copied().fold(f64::INFINITY, f64::min),
            max_price: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            price_volatility: calc::sample_std(&prices).unwrap_or(0.0),
            first_price,
            last_price,
            first_time: first.time(),
            last_time: last.time(),
            price_change: last_price - first_price,
            price_change_pct: if first_price > 0.0 {
                (last_price / first_price - 1.0) * 100.0
            } else {
                0.0
            },
        })
    }
}

/// Percentage share of `a` in `a + b`, 50 when both are zero.
fn share_pct(a: f64, b: f64) -> f64 {
    let total = a + b;
    if total > 0.0 { a / total * 100.0 } else { 50.0 }
}

/// `a / b`, with `None` for an unbounded ratio and 1.0 when both are zero.
fn ratio(a: f64, b: f64) -> Option<f64> {
    if b > 0.0 {
        Some(a / b)
    } else if a > 0.0 {
        None
    } else {
        Some(1.0)
    }
}
