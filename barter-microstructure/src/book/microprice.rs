use crate::{
    error::{MicrostructureError, ensure_finite},
    model::TopOfBook,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkewSignal {
    VeryBullish,
    Bullish,
    #[default]
    Neutral,
    Bearish,
    VeryBearish,
}

impl SkewSignal {
    pub fn from_skew(skew: f64) -> Self {
        if skew >= 0.8 {
            SkewSignal::VeryBullish
        } else if skew >= 0.5 {
            SkewSignal::Bullish
        } else if skew <= -0.8 {
            SkewSignal::VeryBearish
        } else if skew <= -0.5 {
            SkewSignal::Bearish
        } else {
            SkewSignal::Neutral
        }
    }
}

/// Size-weighted fair price at the touch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Microprice {
    pub microprice: f64,
    pub mid: f64,
    pub spread: f64,
    /// `(microprice - mid) / (spread / 2)` clamped to `[-1, 1]`, 0 when spread <= 0.
    pub micro_skew: f64,
    pub signal: SkewSignal,
}

impl Microprice {
    pub fn compute(top: &TopOfBook) -> Result<Self, MicrostructureError> {
        let mid = top.mid();
        let spread = top.spread();
        let touch_quantity = top.bid_quantity + top.ask_quantity;

        let microprice = if touch_quantity > 0.0 {
            (top.ask_price * top.bid_quantity + top.bid_price * top.ask_quantity) / touch_quantity
        } else {
            mid
        };
        let microprice = ensure_finite("microprice", microprice)?;

        let micro_skew = if spread > 0.0 {
            ensure_finite("micro_skew", (microprice - mid) / (spread / 2.0))?.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        Ok(Self {
            microprice,
            mid,
            spread,
            micro_skew,
            signal: SkewSignal::from_skew(micro_skew),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(bid_price: f64, bid_quantity: f64, ask_price: f64, ask_quantity: f64) -> TopOfBook {
        TopOfBook {
            bid_price,
            bid_quantity,
            ask_price,
            ask_quantity,
        }
    }

    #[test]
    fn test_microprice() {
        struct TestCase {
            input: TopOfBook,
            expected_microprice: f64,
            expected_skew: f64,
        }

        let tests = vec![
            TestCase {
                // TC0: balanced touch
                input: top(99.0, 1.0, 101.0, 1.0),
                expected_microprice: 100.0,
                expected_skew: 0.0,
            },
            TestCase {
                // TC1: heavy bid pulls microprice toward the ask
                input: top(99.0, 3.0, 101.0, 1.0),
                expected_microprice: 100.5,
                expected_skew: 0.5,
            },
            TestCase {
                // TC2: empty touch falls back to mid
                input: top(99.0, 0.0, 101.0, 0.0),
                expected_microprice: 100.0,
                expected_skew: 0.0,
            },
            TestCase {
                // TC3: only ask quantity
                input: top(99.0, 0.0, 101.0, 5.0),
                expected_microprice: 99.0,
                expected_skew: -1.0,
            },
            TestCase {
                // TC4: crossed book has no skew
                input: top(101.0, 5.0, 100.0, 1.0),
                expected_microprice: 100.166_666_666_666_67,
                expected_skew: 0.0,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = Microprice::compute(&test.input).unwrap();
            assert!(
                (actual.microprice - test.expected_microprice).abs() < 1e-9,
                "TC{} failed",
                index
            );
            assert!(
                (actual.micro_skew - test.expected_skew).abs() < 1e-12,
                "TC{} failed",
                index
            );
        }
    }

    #[test]
    fn test_skew_signal() {
        assert_eq!(SkewSignal::from_skew(0.9), SkewSignal::VeryBullish);
        assert_eq!(SkewSignal::from_skew(0.5), SkewSignal::Bullish);
        assert_eq!(SkewSignal::from_skew(0.0), SkewSignal::Neutral);
        assert_eq!(SkewSignal::from_skew(-0.6), SkewSignal::Bearish);
        assert_eq!(SkewSignal::from_skew(-1.0), SkewSignal::VeryBearish);
    }
}
