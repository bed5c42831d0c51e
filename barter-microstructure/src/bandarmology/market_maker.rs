use super::BookOrder;
use crate::model::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketMakerBehavior {
    Legitimate,
    Normal,
    Suspicious,
    /// One side of the book is empty.
    Unknown,
}

impl MarketMakerBehavior {
    pub fn classify(symmetry: f64, spread_pct: f64) -> Self {
        if symmetry > 0.8 && spread_pct < 1.0 {
            MarketMakerBehavior::Legitimate
        } else if symmetry < 0.5 || spread_pct > 2.0 {
            MarketMakerBehavior::Suspicious
        } else {
            MarketMakerBehavior::Normal
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpreadStatus {
    Tight,
    Normal,
    Wide,
    VeryWide,
    Unknown,
}

impl SpreadStatus {
    pub fn from_spread_pct(spread_pct: f64) -> Self {
        if spread_pct < 0.5 {
            SpreadStatus::Tight
        } else if spread_pct < 1.0 {
            SpreadStatus::Normal
        } else if spread_pct < 2.0 {
            SpreadStatus::Wide
        } else {
            SpreadStatus::VeryWide
        }
    }
}

/// Spread and two-sided volume symmetry of the analysed orders.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketMakerAnalysis {
    pub best_bid: f64,
    pub best_ask: f64,
    pub spread: f64,
    /// Spread as a percentage of the current price.
    pub spread_pct: f64,
    pub spread_status: SpreadStatus,
    /// `min(buy, sell) / max(buy, sell)` resting volume.
    pub volume_symmetry: f64,
    pub behavior: MarketMakerBehavior,
    pub buy_volume: f64,
    pub sell_volume: f64,
}

impl MarketMakerAnalysis {
    pub fn compute(orders: &[BookOrder], current_price: f64) -> Self {
        let best = |side: Side| {
            orders
                .iter()
                .filter(|order| order.side == side)
                .map(|order| order.price)
                .reduce(|best, price| match side {
                    Side::Buy => best.max(price),
                    Side::Sell => best.min(price),
                })
        };

        let (Some(best_bid), Some(best_ask)) = (best(Side::Buy), best(Side::Sell)) else {
            return Self::unknown();
        };

        let volume = |side: Side| {
            orders
                .iter()
                .filter(|order| order.side == side)
                .map(BookOrder::quantity_f64)
                .sum::<f64>()
        };
        let (buy_volume, sell_volume) = (volume(Side::Buy), volume(Side::Sell));

        let best_bid = BookOrder::decimal_f64(best_bid);
        let best_ask = BookOrder::decimal_f64(best_ask);
        let spread = best_ask - best_bid;
        let spread_pct = if current_price > 0.0 {
            spread / current_price * 100.0
        } else {
            0.0
        };

        let larger = buy_volume.max(sell_volume);
        let volume_symmetry = if larger > 0.0 {
            buy_volume.min(sell_volume) / larger
        } else {
            0.0
        };

        Self {
            best_bid,
            best_ask,
            spread,
            spread_pct,
            spread_status: SpreadStatus::from_spread_pct(spread_pct),
            volume_symmetry,
            behavior: MarketMakerBehavior::classify(volume_symmetry, spread_pct),
            buy_volume,
            sell_volume,
        }
    }

    fn unknown() -> Self {
        Self {
            best_bid: 0.0,
            best_ask: 0.0,
            spread: 0.0,
            spread_pct: 0.0,
            spread_status: SpreadStatus::Unknown,
            volume_symmetry: 0.0,
            behavior: MarketMakerBehavior::Unknown,
            buy_volume: 0.0,
            sell_volume: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order(side: Side, price: i64, quantity: i64) -> BookOrder {
        BookOrder {
            side,
            price: Decimal::from(price),
            quantity: Decimal::from(quantity),
        }
    }

    #[test]
    fn test_market_maker_behavior() {
        struct TestCase {
            orders: Vec<BookOrder>,
            expected_behavior: MarketMakerBehavior,
            expected_status: SpreadStatus,
        }

        let tests = vec![
            TestCase {
                // TC0: balanced and tight
                orders: vec![order(Side::Buy, 999, 10), order(Side::Sell, 1001, 9)],
                expected_behavior: MarketMakerBehavior::Legitimate,
                expected_status: SpreadStatus::Tight,
            },
            TestCase {
                // TC1: lopsided volume
                orders: vec![order(Side::Buy, 999, 10), order(Side::Sell, 1001, 4)],
                expected_behavior: MarketMakerBehavior::Suspicious,
                expected_status: SpreadStatus::Tight,
            },
            TestCase {
                // TC2: balanced but wide
                orders: vec![order(Side::Buy, 990, 10), order(Side::Sell, 1005, 10)],
                expected_behavior: MarketMakerBehavior::Normal,
                expected_status: SpreadStatus::Wide,
            },
            TestCase {
                // TC3: very wide
                orders: vec![order(Side::Buy, 970, 10), order(Side::Sell, 1030, 10)],
                expected_behavior: MarketMakerBehavior::Suspicious,
                expected_status: SpreadStatus::VeryWide,
            },
            TestCase {
                // TC4: one-sided
                orders: vec![order(Side::Buy, 999, 10)],
                expected_behavior: MarketMakerBehavior::Unknown,
                expected_status: SpreadStatus::Unknown,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = MarketMakerAnalysis::compute(&test.orders, 1000.0);
            assert_eq!(actual.behavior, test.expected_behavior, "TC{} failed", index);
            assert_eq!(actual.spread_status, test.expected_status, "TC{} failed", index);
        }
    }
}
