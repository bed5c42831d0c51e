use crate::model::{BookSide, OrderBookSnapshot};
use serde::{Deserialize, Serialize};

/// Band around mid, in percent, treated as the stop zone.
pub const STOP_ZONE_PCT: f64 = 2.0;

/// Maximum number of levels the stop zone depth is averaged over.
const AVERAGING_LEVELS: usize = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeRisk {
    Low,
    Medium,
    High,
}

impl CascadeRisk {
    pub fn from_sri(sri: f64) -> Self {
        if sri >= 70.0 {
            CascadeRisk::High
        } else if sri >= 50.0 {
            CascadeRisk::Medium
        } else {
            CascadeRisk::Low
        }
    }
}

/// Stop risk index proxy derived from depth thinness near mid.
///
/// Higher values mean thinner depth and a higher risk that triggered stops cascade.
/// `sri_sell` reads the bid side (sell stops hit bids), `sri_buy` the ask side.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StopRisk {
    pub sri_buy: f64,
    pub sri_sell: f64,
    pub buy_risk: CascadeRisk,
    pub sell_risk: CascadeRisk,
}

impl StopRisk {
    pub fn compute(book: &OrderBookSnapshot, mid: f64) -> Self {
        let sri_sell = sri(book, BookSide::Bid, mid);
        let sri_buy = sri(book, BookSide::Ask, mid);

        Self {
            sri_buy,
            sri_sell,
            buy_risk: CascadeRisk::from_sri(sri_buy),
            sell_risk: CascadeRisk::from_sri(sri_sell),
        }
    }
}

fn sri(book: &OrderBookSnapshot, side: BookSide, mid: f64) -> f64 {
    let levels = book.side(side).len().min(AVERAGING_LEVELS);
    if levels == 0 {
        return 100.0;
    }

    let average = book.depth_within_pct(side, mid, STOP_ZONE_PCT) / levels as f64;
    if average > 0.0 {
        (100.0 - average / (average + 1.0) * 100.0).clamp(0.0, 100.0)
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstrumentId, OrderBookLevel};
    use rust_decimal::Decimal;

    #[test]
    fn test_stop_risk() {
        let level = |price: i64, quantity: Decimal| {
            OrderBookLevel::new(Decimal::from(price), quantity).unwrap()
        };
        let book = OrderBookSnapshot::new(
            InstrumentId::new("x"),
            // Deep bids: average 9 per level
            vec![level(100, Decimal::from(9)), level(99, Decimal::from(9))],
            // Thin asks: average 0.25 per level
            vec![
                level(101, Decimal::new(25, 2)),
                level(102, Decimal::new(25, 2)),
            ],
        );

        let risk = StopRisk::compute(&book, 100.5);

        assert!((risk.sri_sell - 10.0).abs() < 1e-9);
        assert_eq!(risk.sell_risk, CascadeRisk::Low);
        assert!((risk.sri_buy - 80.0).abs() < 1e-9);
        assert_eq!(risk.buy_risk, CascadeRisk::High);
    }

    #[test]
    fn test_stop_risk_empty_side() {
        let book = OrderBookSnapshot::new(InstrumentId::new("x"), vec![], vec![]);
        let risk = StopRisk::compute(&book, 100.0);
        assert_eq!(risk.sri_buy, 100.0);
        assert_eq!(risk.sri_sell, 100.0);
    }
}
