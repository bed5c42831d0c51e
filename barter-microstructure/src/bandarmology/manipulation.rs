use super::{
    fake::{FakeOrderDetection, OrderClass, ScoredOrder},
    market_maker::{MarketMakerAnalysis, MarketMakerBehavior},
    whale::WhaleActivity,
};
use crate::{
    config::ManipulationPolicy,
    model::{Confidence, Direction, RiskLevel, Side},
};
use serde::{Deserialize, Serialize};

/// Manipulation score bands for [`RiskLevel::Medium`], `High` and `VeryHigh`.
const MANIPULATION_BANDS: [f64; 3] = [30.0, 50.0, 75.0];

/// Whale contribution above which it is listed as a factor.
const WHALE_FACTOR_FLOOR: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ManipulationVerdict {
    /// In `[0, 100]`.
    pub score: f64,
    pub level: RiskLevel,
    pub confidence: Confidence,
    /// Human readable contributors, in evaluation order.
    pub factors: Vec<String>,
}

impl Default for ManipulationVerdict {
    fn default() -> Self {
        Self {
            score: 0.0,
            level: RiskLevel::Low,
            confidence: Confidence::Low,
            factors: Vec::new(),
        }
    }
}

impl ManipulationVerdict {
    /// `min(100, fake_weight * fake_pct + whale_weight * whale_dominance + mm_penalty)`, with
    /// the optional per-factor caps of the policy applied first.
    pub fn compute(
        fake: &FakeOrderDetection,
        whale: &WhaleActivity,
        market_maker: &MarketMakerAnalysis,
        policy: &ManipulationPolicy,
    ) -> Self {
        let mut factors = Vec::new();

        let fake_score = cap(fake.fake_order_pct * policy.fake_weight, policy.fake_cap);
        if fake_score > 0.0 {
            factors.push(format!("Fake orders: {:.1}%", fake.fake_order_pct));
        }

        let whale_score = cap(whale.dominance_pct * policy.whale_weight, policy.whale_cap);
        if whale_score > WHALE_FACTOR_FLOOR {
            factors.push(format!("High whale dominance: {:.1}%", whale.dominance_pct));
        }

        let mm_score = match market_maker.behavior {
            MarketMakerBehavior::Suspicious => {
                factors.push("Suspicious market maker activity".to_string());
                policy.mm_suspicious_penalty
            }
            MarketMakerBehavior::Normal => policy.mm_normal_penalty,
            MarketMakerBehavior::Legitimate | MarketMakerBehavior::Unknown => {
                policy.mm_legitimate_penalty
            }
        };

        let score = (fake_score + whale_score + mm_score).clamp(0.0, 100.0);

        Self {
            score,
            level: RiskLevel::from_thresholds(score, MANIPULATION_BANDS),
            confidence: sample_confidence(fake.total_fake_orders + fake.suspicious_orders),
            factors,
        }
    }
}

fn cap(value: f64, cap: Option<f64>) -> f64 {
    match cap {
        Some(cap) => value.min(cap),
        None => value,
    }
}

fn sample_confidence(flagged: usize) -> Confidence {
    if flagged >= 10 {
        Confidence::High
    } else if flagged >= 5 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Book pressure recomputed from orders classified as real only.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RealOrderDirection {
    pub direction: Direction,
    pub confidence: Confidence,
    pub buy_pressure_pct: f64,
    pub sell_pressure_pct: f64,
    pub real_buy_volume: f64,
    pub real_sell_volume: f64,
}

impl Default for RealOrderDirection {
    fn default() -> Self {
        Self {
            direction: Direction::Neutral,
            confidence: Confidence::Low,
            buy_pressure_pct: 50.0,
            sell_pressure_pct: 50.0,
            real_buy_volume: 0.0,
            real_sell_volume: 0.0,
        }
    }
}

impl RealOrderDirection {
    pub fn compute(scored: &[ScoredOrder]) -> Self {
        let real = scored
            .iter()
            .filter(|scored| scored.class == OrderClass::Real)
            .collect::<Vec<_>>();
        if real.is_empty() {
            return Self::default();
        }

        let volume = |side: Side| {
            real.iter()
                .filter(|scored| scored.order.side == side)
                .map(|scored| scored.order.quantity_f64())
                .sum::<f64>()
        };
        let real_buy_volume = volume(Side::Buy);
        let real_sell_volume = volume(Side::Sell);

        let total = real_buy_volume + real_sell_volume;
        let (buy_pressure_pct, sell_pressure_pct) = if total > 0.0 {
            (
                real_buy_volume / total * 100.0,
                real_sell_volume / total * 100.0,
            )
        } else {
            (50.0, 50.0)
        };

        let strength = |pct: f64| {
            if pct > 65.0 {
                Confidence::High
            } else {
                Confidence::Medium
            }
        };
        let (direction, confidence) = if buy_pressure_pct > 55.0 {
            (Direction::Bullish, strength(buy_pressure_pct))
        } else if sell_pressure_pct > 55.0 {
            (Direction::Bearish, strength(sell_pressure_pct))
        } else {
            (Direction::Neutral, Confidence::Medium)
        };

        Self {
            direction,
            confidence,
            buy_pressure_pct,
            sell_pressure_pct,
            real_buy_volume,
            real_sell_volume,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandarRecommendation {
    Avoid,
    Caution,
    ConsiderBuy,
    ConsiderSell,
    Hold,
}

/// Executive summary of the order book authenticity analysis.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BandarmologySummary {
    pub risk_level: RiskLevel,
    pub recommendation: BandarRecommendation,
    pub reason: String,
}

impl BandarmologySummary {
    pub fn compute(
        verdict: &ManipulationVerdict,
        whale: &WhaleActivity,
        direction: &RealOrderDirection,
    ) -> Self {
        let risk_level = match verdict.level {
            RiskLevel::VeryHigh | RiskLevel::High => RiskLevel::High,
            RiskLevel::Medium => RiskLevel::Medium,
            RiskLevel::Low if whale.level >= RiskLevel::High => RiskLevel::Medium,
            RiskLevel::Low => RiskLevel::Low,
        };

        let (recommendation, reason) = match (verdict.level, direction.direction) {
            (RiskLevel::VeryHigh, _) => (
                BandarRecommendation::Avoid,
                "Very high manipulation, avoid trading",
            ),
            (RiskLevel::High, _) => (
                BandarRecommendation::Caution,
                "High manipulation, trade with caution",
            ),
            (_, Direction::Bullish) => (
                BandarRecommendation::ConsiderBuy,
                "Strong buy pressure from real orders",
            ),
            (_, Direction::Bearish) => (
                BandarRecommendation::ConsiderSell,
                "Strong sell pressure from real orders",
            ),
            (_, Direction::Neutral) => (
                BandarRecommendation::Hold,
                "No clear signal, wait for confirmation",
            ),
        };

        Self {
            risk_level,
            recommendation,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandarmology::{BookOrder, market_maker::SpreadStatus};
    use rust_decimal::Decimal;

    fn detection(
        fake_order_pct: f64,
        total_fake_orders: usize,
        suspicious_orders: usize,
    ) -> FakeOrderDetection {
        FakeOrderDetection {
            total_fake_orders,
            fake_buy_orders: 0,
            fake_sell_orders: 0,
            fake_buy_volume: 0.0,
            fake_sell_volume: 0.0,
            fake_order_pct,
            suspicious_orders,
            top_fake_orders: vec![],
        }
    }

    fn whales(dominance_pct: f64) -> WhaleActivity {
        WhaleActivity {
            dominance_pct,
            ..WhaleActivity::default()
        }
    }

    fn market_maker(behavior: MarketMakerBehavior) -> MarketMakerAnalysis {
        MarketMakerAnalysis {
            best_bid: 0.0,
            best_ask: 0.0,
            spread: 0.0,
            spread_pct: 0.0,
            spread_status: SpreadStatus::Unknown,
            volume_symmetry: 0.0,
            behavior,
            buy_volume: 0.0,
            sell_volume: 0.0,
        }
    }

    #[test]
    fn test_manipulation_verdict() {
        struct TestCase {
            fake_pct: f64,
            whale_dominance: f64,
            behavior: MarketMakerBehavior,
            policy: ManipulationPolicy,
            expected_score: f64,
            expected_level: RiskLevel,
        }

        let tests = vec![
            TestCase {
                // TC0: clean book
                fake_pct: 0.0,
                whale_dominance: 10.0,
                behavior: MarketMakerBehavior::Legitimate,
                policy: ManipulationPolicy::default(),
                expected_score: 6.0,
                expected_level: RiskLevel::Low,
            },
            TestCase {
                // TC1: every factor contributing
                fake_pct: 10.0,
                whale_dominance: 40.0,
                behavior: MarketMakerBehavior::Suspicious,
                policy: ManipulationPolicy::default(),
                expected_score: 74.0,
                expected_level: RiskLevel::High,
            },
            TestCase {
                // TC2: uncapped sum saturates at 100
                fake_pct: 40.0,
                whale_dominance: 60.0,
                behavior: MarketMakerBehavior::Normal,
                policy: ManipulationPolicy::default(),
                expected_score: 100.0,
                expected_level: RiskLevel::VeryHigh,
            },
            TestCase {
                // TC3: per-factor caps
                fake_pct: 40.0,
                whale_dominance: 60.0,
                behavior: MarketMakerBehavior::Normal,
                policy: ManipulationPolicy {
                    fake_cap: Some(40.0),
                    whale_cap: Some(30.0),
                    ..ManipulationPolicy::default()
                },
                expected_score: 80.0,
                expected_level: RiskLevel::VeryHigh,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = ManipulationVerdict::compute(
                &detection(test.fake_pct, 0, 0),
                &whales(test.whale_dominance),
                &market_maker(test.behavior),
                &test.policy,
            );
            assert!((actual.score - test.expected_score).abs() < 1e-9, "TC{} failed", index);
            assert_eq!(actual.level, test.expected_level, "TC{} failed", index);
        }
    }

    #[test]
    fn test_verdict_confidence_and_factors() {
        let verdict = ManipulationVerdict::compute(
            &detection(10.0, 6, 4),
            &whales(40.0),
            &market_maker(MarketMakerBehavior::Suspicious),
            &ManipulationPolicy::default(),
        );

        assert_eq!(verdict.confidence, Confidence::High);
        assert_eq!(verdict.factors.len(), 3);
        assert!(verdict.factors[0].starts_with("Fake orders"));
    }

    fn scored(side: Side, quantity: i64, class: OrderClass) -> ScoredOrder {
        ScoredOrder {
            order: BookOrder {
                side,
                price: Decimal::ONE_HUNDRED,
                quantity: Decimal::from(quantity),
            },
            score: 0.0,
            class,
            reasons: vec![],
        }
    }

    #[test]
    fn test_real_order_direction_excludes_fakes() {
        let orders = vec![
            scored(Side::Buy, 7, OrderClass::Real),
            scored(Side::Sell, 3, OrderClass::Real),
            // Large fake sell wall must not flip the direction
            scored(Side::Sell, 100, OrderClass::Fake),
            scored(Side::Sell, 50, OrderClass::Suspicious),
        ];

        let direction = RealOrderDirection::compute(&orders);
        assert_eq!(direction.direction, Direction::Bullish);
        assert_eq!(direction.confidence, Confidence::High);
        assert!((direction.buy_pressure_pct - 70.0).abs() < 1e-9);

        let none_real = RealOrderDirection::compute(&orders[2..]);
        assert_eq!(none_real, RealOrderDirection::default());
    }

    #[test]
    fn test_summary_recommendation() {
        let verdict = ManipulationVerdict {
            score: 80.0,
            level: RiskLevel::VeryHigh,
            ..ManipulationVerdict::default()
        };
        let summary = BandarmologySummary::compute(
            &verdict,
            &WhaleActivity::default(),
            &RealOrderDirection::default(),
        );
        assert_eq!(summary.recommendation, BandarRecommendation::Avoid);
        assert_eq!(summary.risk_level, RiskLevel::High);

        let bullish = RealOrderDirection {
            direction: Direction::Bullish,
            ..RealOrderDirection::default()
        };
        let whale_heavy = WhaleActivity {
            level: RiskLevel::VeryHigh,
            ..WhaleActivity::default()
        };
        let summary =
            BandarmologySummary::compute(&ManipulationVerdict::default(), &whale_heavy, &bullish);
        assert_eq!(summary.recommendation, BandarRecommendation::ConsiderBuy);
        assert_eq!(summary.risk_level, RiskLevel::Medium);
    }
}
