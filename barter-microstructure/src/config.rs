//! Engine configuration.
//!
//! Every threshold weight and window used by the analyzers lives here so a deployment can
//! recalibrate without a rebuild. Defaults reproduce the canonical policy.
//!
//! Environment overrides (all optional, unparseable values are ignored with a warning):
//!
//! | Variable | Field |
//! |---|---|
//! | `MICRO_TAKER_FEE_PCT` | `fees.taker_fee_pct` |
//! | `MICRO_MAKER_FEE_PCT` | `fees.maker_fee_pct` |
//! | `MICRO_HISTORY_CAPACITY` | `history_capacity` |
//! | `MICRO_MIN_ZSCORE_SAMPLES` | `min_zscore_samples` |
//! | `MICRO_OFI_WINDOW` | `ofi_window` |
//! | `MICRO_KYLE_WINDOW` | `kyle_window` |
//! | `MICRO_AGGRESSIVE_WINDOW` | `aggressive_window` |
//! | `MICRO_MAX_SLIPPAGE_PCT` | `execution.max_slippage_pct` |
//! | `MICRO_MANIPULATION_OVERRIDE` | `signal.manipulation_override` |

use crate::error::MicrostructureError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Tolerance when checking that a weight set sums to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fees: FeeSchedule,
    /// Observations kept per rolling series.
    pub history_capacity: usize,
    /// A series must hold more than this many observations before z-scores are reported.
    pub min_zscore_samples: usize,
    /// Trades per OFI window.
    pub ofi_window: usize,
    /// Trades per Kyle's lambda window.
    pub kyle_window: usize,
    /// Most recent trades used for aggressive pressure and the recent-trade summary.
    pub aggressive_window: usize,
    pub composite: CompositeWeights,
    pub manipulation: ManipulationPolicy,
    pub execution: ExecutionPolicy,
    pub signal: SignalWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            history_capacity: 1000,
            min_zscore_samples: 10,
            ofi_window: 10,
            kyle_window: 5,
            aggressive_window: 20,
            composite: CompositeWeights::default(),
            manipulation: ManipulationPolicy::default(),
            execution: ExecutionPolicy::default(),
            signal: SignalWeights::default(),
        }
    }
}

/// Flat percentage trading fees.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub taker_fee_pct: f64,
    pub maker_fee_pct: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            taker_fee_pct: 0.30,
            maker_fee_pct: 0.00,
        }
    }
}

impl FeeSchedule {
    /// Taker fee as a fraction, eg/ 0.003.
    pub fn taker_rate(&self) -> f64 {
        self.taker_fee_pct / 100.0
    }

    /// Maker fee as a fraction.
    pub fn maker_rate(&self) -> f64 {
        self.maker_fee_pct / 100.0
    }
}

/// Weights of the composite pressure score terms.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub micro_skew: f64,
    pub obi: f64,
    pub ofi: f64,
    pub depth_ratio: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            micro_skew: 0.35,
            obi: 0.25,
            ofi: 0.20,
            depth_ratio: 0.20,
        }
    }
}

impl CompositeWeights {
    fn values(&self) -> [f64; 4] {
        [self.micro_skew, self.obi, self.ofi, self.depth_ratio]
    }
}

/// Thresholds and weights of the manipulation detector.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ManipulationPolicy {
    /// Multiplier applied to the fake order percentage.
    pub fake_weight: f64,
    /// Multiplier applied to whale dominance percentage.
    pub whale_weight: f64,
    pub mm_suspicious_penalty: f64,
    pub mm_normal_penalty: f64,
    pub mm_legitimate_penalty: f64,
    /// Optional ceiling on the weighted fake order contribution.
    pub fake_cap: Option<f64>,
    /// Optional ceiling on the weighted whale contribution.
    pub whale_cap: Option<f64>,
    /// Fake score at or above which an order is FAKE.
    pub fake_threshold: f64,
    /// Fake score at or above which an order is SUSPICIOUS.
    pub suspicious_threshold: f64,
    /// Size percentile marking whale orders.
    pub whale_percentile: f64,
    /// Levels analysed per book side.
    pub levels_per_side: usize,
}

impl Default for ManipulationPolicy {
    fn default() -> Self {
        Self {
            fake_weight: 2.0,
            whale_weight: 0.6,
            mm_suspicious_penalty: 30.0,
            mm_normal_penalty: 10.0,
            mm_legitimate_penalty: 0.0,
            fake_cap: None,
            whale_cap: None,
            fake_threshold: 70.0,
            suspicious_threshold: 40.0,
            whale_percentile: 95.0,
            levels_per_side: 50,
        }
    }
}

/// Execution cost simulation grid.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionPolicy {
    /// Order sizes as percentages of same-side liquidity, ascending.
    pub size_pcts: Vec<f64>,
    /// Largest acceptable absolute slippage percentage.
    pub max_slippage_pct: f64,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            size_pcts: vec![1.0, 5.0, 10.0, 20.0, 30.0, 50.0, 70.0, 100.0],
            max_slippage_pct: 0.5,
        }
    }
}

/// Weights of the final recommendation blend.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalWeights {
    pub microstructure: f64,
    pub trade_flow: f64,
    pub bandarmology: f64,
    pub sentiment: f64,
    pub technical: f64,
    /// Manipulation score at or above which the action is forced to AVOID.
    pub manipulation_override: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            microstructure: 0.30,
            trade_flow: 0.20,
            bandarmology: 0.20,
            sentiment: 0.15,
            technical: 0.15,
            manipulation_override: 70.0,
        }
    }
}

impl SignalWeights {
    fn values(&self) -> [f64; 5] {
        [
            self.microstructure,
            self.trade_flow,
            self.bandarmology,
            self.sentiment,
            self.technical,
        ]
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, MicrostructureError> {
        let config: Self = serde_json::from_str(input)
            .map_err(|error| MicrostructureError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with `MICRO_*` environment overrides applied.
    pub fn from_env() -> Result<Self, MicrostructureError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides resolved through `lookup`.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, MicrostructureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_with(&lookup, "MICRO_TAKER_FEE_PCT", &mut config.fees.taker_fee_pct);
        override_with(&lookup, "MICRO_MAKER_FEE_PCT", &mut config.fees.maker_fee_pct);
        override_with(&lookup, "MICRO_HISTORY_CAPACITY", &mut config.history_capacity);
        override_with(&lookup, "MICRO_MIN_ZSCORE_SAMPLES", &mut config.min_zscore_samples);
        override_with(&lookup, "MICRO_OFI_WINDOW", &mut config.ofi_window);
        override_with(&lookup, "MICRO_KYLE_WINDOW", &mut config.kyle_window);
        override_with(&lookup, "MICRO_AGGRESSIVE_WINDOW", &mut config.aggressive_window);
        override_with(
            &lookup,
            "MICRO_MAX_SLIPPAGE_PCT",
            &mut config.execution.max_slippage_pct,
        );
        override_with(
            &lookup,
            "MICRO_MANIPULATION_OVERRIDE",
            &mut config.signal.manipulation_override,
        );

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MicrostructureError> {
        let invalid = |reason: String| -> Result<(), MicrostructureError> {
            Err(MicrostructureError::InvalidConfig(reason))
        };

        for (name, fee) in [
            ("taker_fee_pct", self.fees.taker_fee_pct),
            ("maker_fee_pct", self.fees.maker_fee_pct),
        ] {
            if !(0.0..100.0).contains(&fee) {
                return invalid(format!("{name} must be within [0, 100), got {fee}"));
            }
        }

        for (name, value) in [
            ("history_capacity", self.history_capacity),
            ("ofi_window", self.ofi_window),
            ("kyle_window", self.kyle_window),
            ("aggressive_window", self.aggressive_window),
            ("manipulation.levels_per_side", self.manipulation.levels_per_side),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be positive"));
            }
        }

        if self.min_zscore_samples >= self.history_capacity {
            return invalid(format!(
                "min_zscore_samples ({}) must be below history_capacity ({})",
                self.min_zscore_samples, self.history_capacity
            ));
        }

        check_weights("composite", &self.composite.values())?;
        check_weights("signal", &self.signal.values())?;

        let manipulation = &self.manipulation;
        if manipulation.suspicious_threshold >= manipulation.fake_threshold {
            return invalid(format!(
                "suspicious_threshold ({}) must be below fake_threshold ({})",
                manipulation.suspicious_threshold, manipulation.fake_threshold
            ));
        }
        if !(manipulation.whale_percentile > 0.0 && manipulation.whale_percentile <= 100.0) {
            return invalid(format!(
                "whale_percentile must be within (0, 100], got {}",
                manipulation.whale_percentile
            ));
        }

        let execution = &self.execution;
        if execution.size_pcts.is_empty() {
            return invalid("execution.size_pcts must not be empty".to_string());
        }
        if execution
            .size_pcts
            .iter()
            .any(|pct| !(*pct > 0.0 && *pct <= 100.0))
        {
            return invalid("execution.size_pcts must be within (0, 100]".to_string());
        }
        if execution.size_pcts.windows(2).any(|pair| pair[0] >= pair[1]) {
            return invalid("execution.size_pcts must be strictly ascending".to_string());
        }
        if !(execution.max_slippage_pct >= 0.0 && execution.max_slippage_pct.is_finite()) {
            return invalid(format!(
                "execution.max_slippage_pct must be non-negative, got {}",
                execution.max_slippage_pct
            ));
        }

        if !(0.0..=100.0).contains(&self.signal.manipulation_override) {
            return invalid(format!(
                "signal.manipulation_override must be within [0, 100], got {}",
                self.signal.manipulation_override
            ));
        }

        Ok(())
    }
}

fn override_with<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };

    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "ignoring unparseable configuration override"),
    }
}

fn check_weights(name: &str, weights: &[f64]) -> Result<(), MicrostructureError> {
    if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
        return Err(MicrostructureError::InvalidConfig(format!(
            "{name} weights must be finite and non-negative"
        )));
    }

    let sum = weights.iter().sum::<f64>();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(MicrostructureError::InvalidConfig(format!(
            "{name} weights must sum to 1.0, got {sum}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_from_json_str_partial() {
        let config =
            EngineConfig::from_json_str(r#"{ "fees": { "taker_fee_pct": 0.21 }, "ofi_window": 20 }"#)
                .unwrap();

        assert_eq!(config.fees.taker_fee_pct, 0.21);
        assert_eq!(config.fees.maker_fee_pct, 0.0);
        assert_eq!(config.ofi_window, 20);
        assert_eq!(config.kyle_window, 5);
    }

    #[test]
    fn test_from_env_with_overrides() {
        let vars = HashMap::from([
            ("MICRO_TAKER_FEE_PCT", "0.1"),
            ("MICRO_OFI_WINDOW", "25"),
            ("MICRO_KYLE_WINDOW", "not-a-number"),
        ]);

        let config =
            EngineConfig::from_env_with(|key| vars.get(key).map(|value| value.to_string())).unwrap();

        assert_eq!(config.fees.taker_fee_pct, 0.1);
        assert_eq!(config.ofi_window, 25);
        assert_eq!(config.kyle_window, 5);
    }

    #[test]
    fn test_validate_rejects() {
        struct TestCase {
            input: EngineConfig,
        }

        let tests = vec![
            TestCase {
                // TC0: fee of 100%
                input: EngineConfig {
                    fees: FeeSchedule {
                        taker_fee_pct: 100.0,
                        maker_fee_pct: 0.0,
                    },
                    ..Default::default()
                },
            },
            TestCase {
                // TC1: zero window
                input: EngineConfig {
                    ofi_window: 0,
                    ..Default::default()
                },
            },
            TestCase {
                // TC2: composite weights off by 0.05
                input: EngineConfig {
                    composite: CompositeWeights {
                        micro_skew: 0.40,
                        ..Default::default()
                    },
                    ..Default::default()
                },
            },
            TestCase {
                // TC3: unordered size grid
                input: EngineConfig {
                    execution: ExecutionPolicy {
                        size_pcts: vec![10.0, 5.0],
                        max_slippage_pct: 0.5,
                    },
                    ..Default::default()
                },
            },
            TestCase {
                // TC4: history too small for z-scores
                input: EngineConfig {
                    history_capacity: 10,
                    ..Default::default()
                },
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.validate();
            assert!(
                matches!(actual, Err(MicrostructureError::InvalidConfig(_))),
                "TC{} failed",
                index
            );
        }
    }

    #[test]
    fn test_from_json_str_rejects_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{"),
            Err(MicrostructureError::InvalidConfig(_))
        ));
    }
}
