use super::BookOrder;
use crate::{config::ManipulationPolicy, model::Side, stats::calc};
use itertools::Itertools;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Orders reported in the top fake list.
const TOP_FAKE_ORDERS: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderClass {
    Real,
    Suspicious,
    Fake,
}

/// Why an order scored as potentially fake.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FakeReason {
    /// Quantity above the same-side mean by more than `sigmas` standard deviations.
    OutsizedQuantity { sigmas: u8, multiple_of_mean: f64 },
    FarFromPrice { distance_pct: f64 },
    RoundNumberPrice,
    WholeNumberQuantity,
    OutsizedNotional,
}

impl std::fmt::Display for FakeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FakeReason::OutsizedQuantity {
                sigmas,
                multiple_of_mean,
            } => write!(
                f,
                "unusually large size ({multiple_of_mean:.2}x average, >{sigmas} sigma)"
            ),
            FakeReason::FarFromPrice { distance_pct } => {
                write!(f, "far from current price ({distance_pct:.1}% away)")
            }
            FakeReason::RoundNumberPrice => write!(f, "placed at a round number price"),
            FakeReason::WholeNumberQuantity => write!(f, "whole number quantity"),
            FakeReason::OutsizedNotional => write!(f, "outsized notional value"),
        }
    }
}

/// Quantity statistics of one book side.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SideStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl SideStats {
    pub fn from_orders<'a>(orders: impl Iterator<Item = &'a BookOrder>) -> Self {
        let quantities = orders.map(|order| order.quantity_f64()).collect::<Vec<_>>();
        Self {
            mean: calc::mean(&quantities).unwrap_or(0.0),
            std: calc::population_variance(&quantities)
                .map(f64::sqrt)
                .unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScoredOrder {
    pub order: BookOrder,
    /// In `[0, 100]`.
    pub score: f64,
    pub class: OrderClass,
    pub reasons: Vec<FakeReason>,
}

/// Score one resting order. Contributions: size outlier up to 30, distance from price up
/// to 25, round number price 15, whole number quantity 10, outsized notional 10.
pub fn score_order(
    order: &BookOrder,
    stats: SideStats,
    current_price: f64,
    policy: &ManipulationPolicy,
) -> ScoredOrder {
    let mut score = 0.0;
    let mut reasons = Vec::new();
    let quantity = order.quantity_f64();

    let sigmas = [(3u8, 30.0), (2, 20.0), (1, 10.0)]
        .into_iter()
        .find(|(sigmas, _)| quantity > stats.mean + f64::from(*sigmas) * stats.std);
    if let Some((sigmas, points)) = sigmas {
        score += points;
        reasons.push(FakeReason::OutsizedQuantity {
            sigmas,
            multiple_of_mean: if stats.mean > 0.0 { quantity / stats.mean } else { 0.0 },
        });
    }

    if current_price > 0.0 {
        let distance_pct = (order.price_f64() - current_price).abs() / current_price * 100.0;
        let points = if distance_pct > 5.0 {
            25.0
        } else if distance_pct > 3.0 {
            15.0
        } else if distance_pct > 2.0 {
            10.0
        } else {
            0.0
        };
        if points > 0.0 {
            score += points;
            reasons.push(FakeReason::FarFromPrice { distance_pct });
        }
    }

    if is_round_number(order.price) {
        score += 15.0;
        reasons.push(FakeReason::RoundNumberPrice);
    }

    if order.quantity.fract().is_zero() {
        score += 10.0;
        reasons.push(FakeReason::WholeNumberQuantity);
    }

    if current_price > 0.0 && order.notional_f64() > stats.mean * current_price * 5.0 {
        score += 10.0;
        reasons.push(FakeReason::OutsizedNotional);
    }

    let score: f64 = f64::min(score, 100.0);
    let class = if score >= policy.fake_threshold {
        OrderClass::Fake
    } else if score >= policy.suspicious_threshold {
        OrderClass::Suspicious
    } else {
        OrderClass::Real
    };

    ScoredOrder {
        order: order.clone(),
        score,
        class,
        reasons,
    }
}

/// Integer part of at least 100 ending in 000 or 500.
pub fn is_round_number(price: Decimal) -> bool {
    match price.trunc().to_i128() {
        Some(integer) if integer >= 100 => matches!(integer % 1000, 0 | 500),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FakeOrderDetection {
    pub total_fake_orders: usize,
    pub fake_buy_orders: usize,
    pub fake_sell_orders: usize,
    pub fake_buy_volume: f64,
    pub fake_sell_volume: f64,
    pub fake_order_pct: f64,
    pub suspicious_orders: usize,
    /// Highest scoring fake orders, best first.
    pub top_fake_orders: Vec<ScoredOrder>,
}

impl FakeOrderDetection {
    pub fn compute(scored: &[ScoredOrder]) -> Self {
        let fakes = scored
            .iter()
            .filter(|scored| scored.class == OrderClass::Fake)
            .collect::<Vec<_>>();

        let (fake_buy, fake_sell): (Vec<&ScoredOrder>, Vec<&ScoredOrder>) = fakes
            .iter()
            .copied()
            .partition(|scored| scored.order.side == Side::Buy);

        let volume = |orders: &[&ScoredOrder]| {
            orders
                .iter()
                .map(|scored| scored.order.quantity_f64())
                .sum::<f64>()
        };

        Self {
            total_fake_orders: fakes.len(),
            fake_buy_orders: fake_buy.len(),
            fake_sell_orders: fake_sell.len(),
            fake_buy_volume: volume(&fake_buy),
            fake_sell_volume: volume(&fake_sell),
            fake_order_pct: pct(fakes.len(), scored.len()),
            suspicious_orders: scored
                .iter()
                .filter(|scored| scored.class == OrderClass::Suspicious)
                .count(),
            top_fake_orders: fakes
                .into_iter()
                .sorted_by(|a, b| b.score.total_cmp(&a.score))
                .take(TOP_FAKE_ORDERS)
                .cloned()
                .collect(),
        }
    }
}

/// Split of all analysed orders by [`OrderClass`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderAuthenticity {
    pub real_orders: usize,
    pub suspicious_orders: usize,
    pub fake_orders: usize,
    pub real_pct: f64,
    pub suspicious_pct: f64,
    pub fake_pct: f64,
    pub real_buy_orders: usize,
    pub real_sell_orders: usize,
}

impl OrderAuthenticity {
    pub fn compute(scored: &[ScoredOrder]) -> Self {
        let count = |class: OrderClass| scored.iter().filter(|scored| scored.class == class).count();
        let real_on = |side: Side| {
            scored
                .iter()
                .filter(|scored| scored.class == OrderClass::Real && scored.order.side == side)
                .count()
        };

        let (real, suspicious, fake) = (
            count(OrderClass::Real),
            count(OrderClass::Suspicious),
            count(OrderClass::Fake),
        );

        Self {
            real_orders: real,
            suspicious_orders: suspicious,
            fake_orders: fake,
            real_pct: pct(real, scored.len()),
            suspicious_pct: pct(suspicious, scored.len()),
            fake_pct: pct(fake, scored.len()),
            real_buy_orders: real_on(Side::Buy),
            real_sell_orders: real_on(Side::Sell),
        }
    }
}

fn pct(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(side: Side, price: Decimal, quantity: Decimal) -> BookOrder {
        BookOrder {
            side,
            price,
            quantity,
        }
    }

    #[test]
    fn test_is_round_number() {
        struct TestCase {
            input: Decimal,
            expected: bool,
        }

        let tests = vec![
            TestCase { input: dec!(100000), expected: true },   // TC0
            TestCase { input: dec!(95500.75), expected: true }, // TC1
            TestCase { input: dec!(95013), expected: false },   // TC2
            TestCase { input: dec!(0), expected: false },       // TC3
            TestCase { input: dec!(500), expected: true },      // TC4
            TestCase { input: dec!(99.5), expected: false },    // TC5
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(is_round_number(test.input), test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_outsized_round_far_order_is_fake() {
        // 19 asks of size 10 near the price plus one of size 50 at a round 100000
        let mut asks = (0..19)
            .map(|i| order(Side::Sell, Decimal::from(95_013 + i * 7), dec!(10)))
            .collect::<Vec<_>>();
        asks.push(order(Side::Sell, dec!(100000), dec!(50)));

        let stats = SideStats::from_orders(asks.iter());
        assert_eq!(stats.mean, 12.0);

        let policy = ManipulationPolicy::default();
        let scored = score_order(&asks[19], stats, 95_000.0, &policy);

        // size 30 + distance 25 + round 15 + whole quantity 10
        assert_eq!(scored.score, 80.0);
        assert_eq!(scored.class, OrderClass::Fake);
        assert_eq!(scored.reasons.len(), 4);

        let typical = score_order(&asks[0], stats, 95_000.0, &policy);
        assert_eq!(typical.score, 10.0);
        assert_eq!(typical.class, OrderClass::Real);
    }

    #[test]
    fn test_detection_summary() {
        let policy = ManipulationPolicy::default();
        let stats = SideStats {
            mean: 1.0,
            std: 0.0,
        };
        let scored = vec![
            score_order(&order(Side::Buy, dec!(90000), dec!(6)), stats, 95_000.0, &policy),
            score_order(&order(Side::Buy, dec!(94999), dec!(0.5)), stats, 95_000.0, &policy),
            score_order(&order(Side::Sell, dec!(94000), dec!(0.5)), stats, 95_000.0, &policy),
        ];

        // 30 + 25 + 15 + 10 + 10 = 90, then 0 and 15
        assert_eq!(scored[0].score, 90.0);
        assert_eq!(scored[1].score, 0.0);

        let detection = FakeOrderDetection::compute(&scored);
        assert_eq!(detection.total_fake_orders, 1);
        assert_eq!(detection.fake_buy_orders, 1);
        assert_eq!(detection.fake_buy_volume, 6.0);
        assert!((detection.fake_order_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(detection.top_fake_orders.len(), 1);

        let authenticity = OrderAuthenticity::compute(&scored);
        assert_eq!(authenticity.real_orders, 2);
        assert_eq!(authenticity.real_buy_orders, 1);
        assert_eq!(authenticity.real_sell_orders, 1);
    }
}
