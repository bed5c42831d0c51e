//! Bandarmology: order authenticity, whale concentration and market maker behaviour read
//! from resting orders, combined into a manipulation verdict.
//!
//! Every resting order within [`ManipulationPolicy::levels_per_side`] of the top of each
//! side is scored against the quantity statistics of its own side. Orders classified
//! FAKE or SUSPICIOUS are excluded when recomputing the "real" book direction.

use crate::{
    book::UnavailableReason,
    config::ManipulationPolicy,
    error::{MicrostructureError, ensure_finite},
    model::{
        BookSide, InstrumentId, MarketContext, OrderBookLevel, OrderBookSnapshot, Side, TradeTape,
    },
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-order fake scoring, detection summary and authenticity split.
pub mod fake;

/// Manipulation verdict, real order direction and executive summary.
pub mod manipulation;

/// Spread and volume symmetry of the quoting participants.
pub mod market_maker;

/// Percentile based whale detection.
pub mod whale;

pub use fake::{FakeOrderDetection, FakeReason, OrderAuthenticity, OrderClass, ScoredOrder};
pub use manipulation::{
    BandarRecommendation, BandarmologySummary, ManipulationVerdict, RealOrderDirection,
};
pub use market_maker::{MarketMakerAnalysis, MarketMakerBehavior, SpreadStatus};
pub use whale::WhaleActivity;

/// Resting order taken from one side of the book. Bids are buy orders, asks sell orders.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BookOrder {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl BookOrder {
    pub fn from_level(side: BookSide, level: &OrderBookLevel) -> Self {
        Self {
            side: match side {
                BookSide::Bid => Side::Buy,
                BookSide::Ask => Side::Sell,
            },
            price: level.price,
            quantity: level.quantity,
        }
    }

    pub fn decimal_f64(value: Decimal) -> f64 {
        value.to_f64().unwrap_or(0.0)
    }

    pub fn price_f64(&self) -> f64 {
        Self::decimal_f64(self.price)
    }

    pub fn quantity_f64(&self) -> f64 {
        Self::decimal_f64(self.quantity)
    }

    pub fn notional_f64(&self) -> f64 {
        self.price_f64() * self.quantity_f64()
    }
}

/// Full bandarmology read of one snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Bandarmology {
    /// Reference price used for distance and notional checks, 0 when unknown.
    pub current_price: f64,
    pub orders_analysed: usize,
    pub fake_orders: FakeOrderDetection,
    pub authenticity: OrderAuthenticity,
    pub whale: WhaleActivity,
    pub market_maker: MarketMakerAnalysis,
    pub manipulation: ManipulationVerdict,
    pub real_direction: RealOrderDirection,
    pub summary: BandarmologySummary,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandarmologyReport {
    Unavailable { reason: UnavailableReason },
    Available(Box<Bandarmology>),
}

impl BandarmologyReport {
    pub fn analysis(&self) -> Option<&Bandarmology> {
        match self {
            BandarmologyReport::Unavailable { .. } => None,
            BandarmologyReport::Available(analysis) => Some(analysis),
        }
    }

    /// Manipulation score, 0 when unavailable.
    pub fn manipulation_score(&self) -> f64 {
        self.analysis()
            .map(|analysis| analysis.manipulation.score)
            .unwrap_or(0.0)
    }

    pub fn real_direction(&self) -> Option<&RealOrderDirection> {
        self.analysis().map(|analysis| &analysis.real_direction)
    }
}

#[derive(Debug, Clone)]
pub struct ManipulationDetector {
    policy: ManipulationPolicy,
}

impl ManipulationDetector {
    pub fn new(policy: ManipulationPolicy) -> Self {
        Self { policy }
    }

    pub fn analyze(
        &self,
        instrument: &InstrumentId,
        book: &OrderBookSnapshot,
        tape: &TradeTape,
        context: Option<&MarketContext>,
    ) -> Result<BandarmologyReport, MicrostructureError> {
        if book.is_empty() {
            debug!(%instrument, "empty order book, bandarmology unavailable");
            return Ok(BandarmologyReport::Unavailable {
                reason: UnavailableReason::EmptyBook,
            });
        }

        let orders = [BookSide::Bid, BookSide::Ask]
            .into_iter()
            .flat_map(|side| {
                book.side(side)
                    .iter()
                    .take(self.policy.levels_per_side)
                    .map(move |level| BookOrder::from_level(side, level))
            })
            .collect::<Vec<_>>();

        let current_price = ensure_finite(
            "bandarmology current price",
            current_price(book, tape, context),
        )?;

        let buy_stats = fake::SideStats::from_orders(orders.iter().filter(|o| o.side.is_buy()));
        let sell_stats = fake::SideStats::from_orders(orders.iter().filter(|o| o.side.is_sell()));

        let scored = orders
            .iter()
            .map(|order| {
                let stats = match order.side {
                    Side::Buy => buy_stats,
                    Side::Sell => sell_stats,
                };
                fake::score_order(order, stats, current_price, &self.policy)
            })
            .collect::<Vec<_>>();

        let fake_orders = FakeOrderDetection::compute(&scored);
        let whale = WhaleActivity::compute(&orders, self.policy.whale_percentile);
        let market_maker = MarketMakerAnalysis::compute(&orders, current_price);
        let manipulation =
            ManipulationVerdict::compute(&fake_orders, &whale, &market_maker, &self.policy);
        let real_direction = RealOrderDirection::compute(&scored);
        let summary = BandarmologySummary::compute(&manipulation, &whale, &real_direction);

        debug!(
            %instrument,
            orders = orders.len(),
            fake = fake_orders.total_fake_orders,
            score = manipulation.score,
            "bandarmology analysed"
        );

        Ok(BandarmologyReport::Available(Box::new(Bandarmology {
            current_price,
            orders_analysed: orders.len(),
            authenticity: OrderAuthenticity::compute(&scored),
            fake_orders,
            whale,
            market_maker,
            manipulation,
            real_direction,
            summary,
        })))
    }
}

/// Ticker last price, else the latest trade, else mid, else 0.
fn current_price(
    book: &OrderBookSnapshot,
    tape: &TradeTape,
    context: Option<&MarketContext>,
) -> f64 {
    context
        .and_then(|context| context.last_price)
        .filter(|price| price.is_finite() && *price > 0.0)
        .or_else(|| tape.last().map(|trade| trade.price_f64()))
        .or_else(|| book.mid_price())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RiskLevel, Trade};
    use rust_decimal_macros::dec;

    fn level(price: Decimal, quantity: Decimal) -> OrderBookLevel {
        OrderBookLevel::new(price, quantity).unwrap()
    }

    fn book() -> OrderBookSnapshot {
        // 19 asks of size 10 near the price and a size 50 wall at a round 100000
        let mut asks = (0..19)
            .map(|i| level(Decimal::from(95_013 + i * 7), dec!(10)))
            .collect::<Vec<_>>();
        asks.push(level(dec!(100000), dec!(50)));

        let bids = (0..20)
            .map(|i| level(Decimal::from(94_987 - i * 7), dec!(10.25)))
            .collect::<Vec<_>>();

        OrderBookSnapshot::new(InstrumentId::new("btc_idr"), bids, asks)
    }

    fn context(last_price: f64) -> MarketContext {
        MarketContext {
            last_price: Some(last_price),
            high_24h: None,
            low_24h: None,
        }
    }

    #[test]
    fn test_detects_fake_wall() {
        let detector = ManipulationDetector::new(ManipulationPolicy::default());
        let id = InstrumentId::new("btc_idr");

        let report = detector
            .analyze(&id, &book(), &TradeTape::default(), Some(&context(95_000.0)))
            .unwrap();
        let analysis = report.analysis().unwrap();

        assert_eq!(analysis.current_price, 95_000.0);
        assert_eq!(analysis.orders_analysed, 40);
        assert_eq!(analysis.fake_orders.total_fake_orders, 1);
        assert_eq!(analysis.fake_orders.fake_sell_orders, 1);

        let top = &analysis.fake_orders.top_fake_orders[0];
        assert_eq!(top.order.price, dec!(100000));
        assert_eq!(top.score, 80.0);

        // The fake wall is excluded, leaving the book balanced toward the bids
        assert_eq!(analysis.real_direction.real_sell_volume, 190.0);
        assert_eq!(analysis.real_direction.real_buy_volume, 205.0);
    }

    #[test]
    fn test_levels_per_side_limit() {
        let detector = ManipulationDetector::new(ManipulationPolicy {
            levels_per_side: 5,
            ..ManipulationPolicy::default()
        });
        let id = InstrumentId::new("btc_idr");

        let report = detector
            .analyze(&id, &book(), &TradeTape::default(), None)
            .unwrap();
        let analysis = report.analysis().unwrap();

        assert_eq!(analysis.orders_analysed, 10);
        assert_eq!(analysis.fake_orders.total_fake_orders, 0);
        assert_eq!(
            analysis.market_maker.behavior,
            MarketMakerBehavior::Legitimate
        );
        // Only the five bids of 10.25 reach the 95th percentile: 51.25 / 101.25
        assert!((analysis.whale.dominance_pct - 5125.0 / 101.25).abs() < 1e-9);
        assert_eq!(analysis.manipulation.level, RiskLevel::Medium);
    }

    #[test]
    fn test_current_price_fallbacks() {
        let book = book();
        let tape = TradeTape::new(vec![Trade {
            timestamp: 1,
            price: dec!(94_990),
            quantity: dec!(1),
            side: Side::Buy,
            id: None,
        }]);

        assert_eq!(current_price(&book, &tape, Some(&context(95_100.0))), 95_100.0);
        assert_eq!(current_price(&book, &tape, Some(&context(f64::NAN))), 94_990.0);
        assert_eq!(current_price(&book, &TradeTape::default(), None), 95_000.0);
    }

    #[test]
    fn test_empty_book_unavailable() {
        let detector = ManipulationDetector::new(ManipulationPolicy::default());
        let id = InstrumentId::new("x");
        let book = OrderBookSnapshot::new(id.clone(), vec![], vec![]);

        let report = detector
            .analyze(&id, &book, &TradeTape::default(), None)
            .unwrap();

        assert_eq!(
            report,
            BandarmologyReport::Unavailable {
                reason: UnavailableReason::EmptyBook
            }
        );
        assert_eq!(report.manipulation_score(), 0.0);
    }
}
