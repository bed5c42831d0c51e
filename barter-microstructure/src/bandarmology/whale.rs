use super::BookOrder;
use crate::{
    model::{Direction, RiskLevel, Side},
    stats::calc,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Whale orders reported in the top list.
const TOP_WHALE_ORDERS: usize = 3;

/// Dominance percentage bands for [`RiskLevel::Medium`], `High` and `VeryHigh`.
const DOMINANCE_BANDS: [f64; 3] = [20.0, 35.0, 50.0];

/// Resting orders at or above the configured size percentile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WhaleActivity {
    /// Quantity at the whale percentile.
    pub threshold: f64,
    pub total_whale_orders: usize,
    pub whale_buy_orders: usize,
    pub whale_sell_orders: usize,
    pub whale_buy_volume: f64,
    pub whale_sell_volume: f64,
    /// Whale volume as a percentage of all analysed volume.
    pub dominance_pct: f64,
    pub pressure: Direction,
    pub level: RiskLevel,
    pub top_whale_orders: Vec<BookOrder>,
}

impl Default for WhaleActivity {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            total_whale_orders: 0,
            whale_buy_orders: 0,
            whale_sell_orders: 0,
            whale_buy_volume: 0.0,
            whale_sell_volume: 0.0,
            dominance_pct: 0.0,
            pressure: Direction::Neutral,
            level: RiskLevel::Low,
            top_whale_orders: Vec::new(),
        }
    }
}

impl WhaleActivity {
    pub fn compute(orders: &[BookOrder], percentile: f64) -> Self {
        let quantities = orders.iter().map(BookOrder::quantity_f64).collect::<Vec<_>>();
        let Some(threshold) = calc::percentile(&quantities, percentile) else {
            return Self::default();
        };

        let whales = orders
            .iter()
            .filter(|order| order.quantity_f64() >= threshold)
            .collect::<Vec<_>>();

        let side_volume = |side: Side| {
            whales
                .iter()
                .filter(|order| order.side == side)
                .map(|order| order.quantity_f64())
                .sum::<f64>()
        };
        let whale_buy_volume = side_volume(Side::Buy);
        let whale_sell_volume = side_volume(Side::Sell);

        let total_volume = quantities.iter().sum::<f64>();
        let dominance_pct = if total_volume > 0.0 {
            (whale_buy_volume + whale_sell_volume) / total_volume * 100.0
        } else {
            0.0
        };

        Self {
            threshold,
            total_whale_orders: whales.len(),
            whale_buy_orders: whales.iter().filter(|order| order.side.is_buy()).count(),
            whale_sell_orders: whales.iter().filter(|order| order.side.is_sell()).count(),
            whale_buy_volume,
            whale_sell_volume,
            dominance_pct,
            pressure: Direction::from_volumes(whale_buy_volume, whale_sell_volume, 1.2),
            level: RiskLevel::from_thresholds(dominance_pct, DOMINANCE_BANDS),
            top_whale_orders: whales
                .into_iter()
                .sorted_by(|a, b| b.quantity.cmp(&a.quantity))
                .take(TOP_WHALE_ORDERS)
                .cloned()
                .collect(),
        }
    }
}
