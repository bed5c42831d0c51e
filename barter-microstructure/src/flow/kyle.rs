use crate::{
    error::{MicrostructureError, ensure_finite},
    model::{Confidence, Trade},
    stats::calc,
};
use serde::{Deserialize, Serialize};

/// Minimum tape length before Kyle's lambda is estimated.
pub const KYLE_MIN_TRADES: usize = 10;

/// Tape length from which the estimate is reported with medium confidence.
const KYLE_MEDIUM_CONFIDENCE_TRADES: usize = 50;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceImpact {
    /// Illiquid market.
    High,
    Medium,
    /// Liquid market.
    Low,
}

impl PriceImpact {
    pub fn from_lambda(lambda: f64) -> Self {
        let abs = lambda.abs();
        if abs > 0.1 {
            PriceImpact::High
        } else if abs > 0.01 {
            PriceImpact::Medium
        } else {
            PriceImpact::Low
        }
    }
}

/// Kyle's lambda price impact coefficient.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KyleLambda {
    /// Tape too short for an estimate.
    Insufficient { trades: usize },
    Estimated {
        value: f64,
        impact: PriceImpact,
        confidence: Confidence,
        windows: usize,
    },
}

impl KyleLambda {
    /// Estimate `cov(dp, q) / var(q)` over overlapping windows of `window` trades, where
    /// `dp = price[i] - price[i - window]` and `q` is the signed volume of
    /// `trades[i - window..i]`.
    ///
    /// Both moments use the population normalisation. Zero variance of `q` yields 0.
    pub fn estimate(trades: &[Trade], window: usize) -> Result<Self, MicrostructureError> {
        let window = window.max(1);
        if trades.len() < KYLE_MIN_TRADES || trades.len() <= window {
            return Ok(KyleLambda::Insufficient {
                trades: trades.len(),
            });
        }

        let (delta_prices, net_sizes): (Vec<f64>, Vec<f64>) = (window..trades.len())
            .map(|index| {
                let delta_price = trades[index].price_f64() - trades[index - window].price_f64();
                let net_size = trades[index - window..index]
                    .iter()
                    .map(Trade::signed_quantity)
                    .sum::<f64>();
                (delta_price, net_size)
            })
            .unzip();

        let covariance = calc::population_covariance(&delta_prices, &net_sizes).unwrap_or(0.0);
        let variance = calc::population_variance(&net_sizes).unwrap_or(0.0);

        let value = if variance > 0.0 {
            ensure_finite("kyle_lambda", covariance / variance)?
        } else {
            0.0
        };

        let confidence = if trades.len() >= KYLE_MEDIUM_CONFIDENCE_TRADES {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        Ok(KyleLambda::Estimated {
            value,
            impact: PriceImpact::from_lambda(value),
            confidence,
            windows: net_sizes.len(),
        })
    }

    pub fn value(&self) -> f64 {
        match self {
            KyleLambda::Insufficient { .. } => 0.0,
            KyleLambda::Estimated { value, .. } => *value,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            KyleLambda::Insufficient { .. } => Confidence::Low,
            KyleLambda::Estimated { confidence, .. } => *confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;
    use rust_decimal::Decimal;

    fn trade(side: Side, price: i64, quantity: i64) -> Trade {
        Trade {
            timestamp: 0,
            price: Decimal::from(price),
            quantity: Decimal::from(quantity),
            side,
            id: None,
        }
    }

    #[test]
    fn test_kyle_insufficient_below_ten_trades() {
        for len in 0..KYLE_MIN_TRADES {
            let trades = (0..len).map(|i| trade(Side::Buy, 100 + i as i64, 1)).collect::<Vec<_>>();
            let lambda = KyleLambda::estimate(&trades, 5).unwrap();
            assert_eq!(lambda, KyleLambda::Insufficient { trades: len });
            assert_eq!(lambda.value(), 0.0);
            assert_eq!(lambda.confidence(), Confidence::Low);
        }
    }

    #[test]
    fn test_kyle_zero_variance_is_zero() {
        // Constant net size in every window
        let trades = (0..20).map(|i| trade(Side::Buy, 100 + i, 1)).collect::<Vec<_>>();
        let lambda = KyleLambda::estimate(&trades, 5).unwrap();
        assert_eq!(lambda.value(), 0.0);
        assert!(matches!(lambda, KyleLambda::Estimated { windows: 15, .. }));
    }

    #[test]
    fn test_kyle_positive_impact() {
        // Price moves up with net buying and down with net selling
        let mut trades = Vec::new();
        let mut price = 1000;
        for block in 0..12 {
            let side = if block % 2 == 0 { Side::Buy } else { Side::Sell };
            for _ in 0..5 {
                price += if side == Side::Buy { 10 } else { -10 };
                trades.push(trade(side, price, 2));
            }
        }

        let lambda = KyleLambda::estimate(&trades, 5).unwrap();
        assert!(lambda.value() > 0.1);
        assert_eq!(PriceImpact::from_lambda(lambda.value()), PriceImpact::High);
        assert_eq!(lambda.confidence(), Confidence::Medium);
    }
}
