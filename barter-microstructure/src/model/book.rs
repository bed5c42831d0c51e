use super::{InstrumentId, raw::{RawOrderBook, decimal_from_value}};
use crate::error::MicrostructureError;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Side of the order book.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookSide {
    Bid,
    Ask,
}

/// Price/quantity level in an order book.
///
/// Invariant: `price > 0`, `quantity >= 0`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderBookLevel {
    pub fn new(price: Decimal, quantity: Decimal) -> Result<Self, MicrostructureError> {
        if price <= Decimal::ZERO {
            return Err(MicrostructureError::MalformedRecord(format!(
                "level price must be positive, got {price}"
            )));
        }
        if quantity < Decimal::ZERO {
            return Err(MicrostructureError::MalformedRecord(format!(
                "level quantity must be non-negative, got {quantity}"
            )));
        }
        Ok(Self { price, quantity })
    }

    /// Parse `[price, quantity, ..]` arrays or `{"price", "qty" | "amount"}` objects.
    pub fn from_value(value: &Value) -> Result<Self, MicrostructureError> {
        let (price, quantity) = match value {
            Value::Array(items) if items.len() >= 2 => (&items[0], &items[1]),
            Value::Object(fields) => {
                let price = fields.get("price").unwrap_or(&Value::Null);
                let quantity = fields
                    .get("qty")
                    .or_else(|| fields.get("quantity"))
                    .or_else(|| fields.get("amount"))
                    .unwrap_or(&Value::Null);
                (price, quantity)
            }
            _ => {
                return Err(MicrostructureError::MalformedRecord(format!(
                    "unsupported level shape: {value}"
                )));
            }
        };

        Self::new(decimal_from_value(price)?, decimal_from_value(quantity)?)
    }

    pub fn price_f64(&self) -> f64 {
        self.price.to_f64().unwrap_or(0.0)
    }

    pub fn quantity_f64(&self) -> f64 {
        self.quantity.to_f64().unwrap_or(0.0)
    }

    /// Price x quantity in quote currency.
    pub fn notional_f64(&self) -> f64 {
        self.price_f64() * self.quantity_f64()
    }
}

/// Best bid and ask with their resting quantities.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopOfBook {
    pub bid_price: f64,
    pub bid_quantity: f64,
    pub ask_price: f64,
    pub ask_quantity: f64,
}

impl TopOfBook {
    pub fn mid(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }

    /// Ask minus bid, negative for crossed books.
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    /// Spread as a percentage of mid price.
    pub fn spread_pct(&self) -> f64 {
        let mid = self.mid();
        if mid > 0.0 { self.spread() / mid * 100.0 } else { 0.0 }
    }

    pub fn is_crossed(&self) -> bool {
        self.bid_price >= self.ask_price
    }
}

/// Immutable order book snapshot for one analysis pass.
///
/// Bids are held best-first (descending price), asks best-first (ascending price).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderBookSnapshot {
    pub instrument: InstrumentId,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBookSnapshot {
    pub fn new(
        instrument: InstrumentId,
        mut bids: Vec<OrderBookLevel>,
        mut asks: Vec<OrderBookLevel>,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self {
            instrument,
            bids,
            asks,
        }
    }

    /// Build a snapshot from raw levels, skipping any level that fails to parse.
    pub fn from_raw(instrument: InstrumentId, raw: &RawOrderBook) -> Self {
        let bids = parse_side(&instrument, BookSide::Bid, &raw.bids);
        let asks = parse_side(&instrument, BookSide::Ask, &raw.asks);
        Self::new(instrument, bids, asks)
    }

    pub fn side(&self, side: BookSide) -> &[OrderBookLevel] {
        match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// True when exactly one side of the book has levels.
    pub fn is_one_sided(&self) -> bool {
        self.bids.is_empty() != self.asks.is_empty()
    }

    pub fn best_bid(&self) -> Option<&OrderBookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&OrderBookLevel> {
        self.asks.first()
    }

    pub fn top_of_book(&self) -> Option<TopOfBook> {
        let (bid, ask) = (self.best_bid()?, self.best_ask()?);
        Some(TopOfBook {
            bid_price: bid.price_f64(),
            bid_quantity: bid.quantity_f64(),
            ask_price: ask.price_f64(),
            ask_quantity: ask.quantity_f64(),
        })
    }

    pub fn mid_price(&self) -> Option<f64> {
        self.top_of_book().map(|top| top.mid())
    }

    /// Sum of quantities over the first `levels` levels of a side.
    pub fn depth_top(&self, side: BookSide, levels: usize) -> f64 {
        self.side(side)
            .iter()
            .take(levels)
            .map(OrderBookLevel::quantity_f64)
            .sum()
    }

    /// Sum of quantities resting within `pct` percent of `reference` on the given side.
    ///
    /// Bids count when `price >= reference * (1 - pct/100)`, asks when
    /// `price <= reference * (1 + pct/100)`.
    pub fn depth_within_pct(&self, side: BookSide, reference: f64, pct: f64) -> f64 {
        let fraction = pct / 100.0;
        match side {
            BookSide::Bid => {
                let bound = reference * (1.0 - fraction);
                self.bids
                    .iter()
                    .filter(|level| level.price_f64() >= bound)
                    .map(OrderBookLevel::quantity_f64)
                    .sum()
            }
            BookSide::Ask => {
                let bound = reference * (1.0 + fraction);
                self.asks
                    .iter()
                    .filter(|level| level.price_f64() <= bound)
                    .map(OrderBookLevel::quantity_f64)
                    .sum()
            }
        }
    }

    /// Total resting quantity on a side.
    pub fn total_quantity(&self, side: BookSide) -> Decimal {
        self.side(side).iter().map(|level| level.quantity).sum()
    }
}

fn parse_side(instrument: &InstrumentId, side: BookSide, raw: &[Value]) -> Vec<OrderBookLevel> {
    raw.iter()
        .filter_map(|value| match OrderBookLevel::from_value(value) {
            Ok(level) => Some(level),
            Err(error) => {
                debug!(%instrument, ?side, %error, "skipping malformed order book level");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw_book() -> RawOrderBook {
        RawOrderBook {
            bids: vec![
                json!(["99", "2"]),
                json!(["100", "1.5"]),
                json!(["abc", "1"]),
                json!({ "price": 98, "amount": 3 }),
            ],
            asks: vec![json!([102, 1]), json!(["101", "2.5"]), json!(["103", "-1"])],
        }
    }

    #[test]
    fn test_from_raw_sorts_and_skips_malformed() {
        let book = OrderBookSnapshot::from_raw(InstrumentId::new("btc_idr"), &raw_book());

        let bid_prices: Vec<_> = book.bids.iter().map(|level| level.price).collect();
        let ask_prices: Vec<_> = book.asks.iter().map(|level| level.price).collect();
        assert_eq!(bid_prices, vec![dec!(100), dec!(99), dec!(98)]);
        assert_eq!(ask_prices, vec![dec!(101), dec!(102)]);
    }

    #[test]
    fn test_level_validation() {
        assert!(OrderBookLevel::new(dec!(0), dec!(1)).is_err());
        assert!(OrderBookLevel::new(dec!(1), dec!(-0.1)).is_err());
        assert!(OrderBookLevel::new(dec!(1), dec!(0)).is_ok());
        assert!(OrderBookLevel::from_value(&json!(["1"])).is_err());
        assert!(OrderBookLevel::from_value(&json!("1")).is_err());
    }

    #[test]
    fn test_top_of_book() {
        let book = OrderBookSnapshot::from_raw(InstrumentId::new("btc_idr"), &raw_book());
        let top = book.top_of_book().unwrap();

        assert_eq!(top.bid_price, 100.0);
        assert_eq!(top.ask_price, 101.0);
        assert_eq!(top.mid(), 100.5);
        assert_eq!(top.spread(), 1.0);
        assert!((top.spread_pct() - 0.995).abs() < 0.001);
        assert!(!top.is_crossed());
    }

    #[test]
    fn test_one_sided_and_empty() {
        let empty = OrderBookSnapshot::new(InstrumentId::new("x"), vec![], vec![]);
        assert!(empty.is_empty());
        assert!(!empty.is_one_sided());
        assert!(empty.top_of_book().is_none());

        let bids_only = OrderBookSnapshot::new(
            InstrumentId::new("x"),
            vec![OrderBookLevel::new(dec!(10), dec!(1)).unwrap()],
            vec![],
        );
        assert!(bids_only.is_one_sided());
        assert!(bids_only.mid_price().is_none());
    }

    #[test]
    fn test_depth_within_pct() {
        let book = OrderBookSnapshot::from_raw(InstrumentId::new("btc_idr"), &raw_book());

        // Within 1% of 100: bids >= 99, asks <= 101
        assert_eq!(book.depth_within_pct(BookSide::Bid, 100.0, 1.0), 3.5);
        assert_eq!(book.depth_within_pct(BookSide::Ask, 100.0, 1.0), 2.5);
        assert_eq!(book.depth_top(BookSide::Bid, 2), 3.5);
        assert_eq!(book.total_quantity(BookSide::Bid), dec!(6.5));
    }
}
