//! Composite pressure score.
//!
//! `CPS = 100 * (w_skew * micro_skew + w_obi * OBI_5 + w_ofi * tanh(z_OFI / 2) + w_depth * depth)`
//! where `depth` is `tanh(z_log_dratio / 2)` for finite depth ratios and pinned to `+/-1` for
//! saturated ones. Every term is bounded to `[-1, 1]` before weighting so the score stays in
//! `[-100, 100]`.

use crate::{
    book::OrderBookReport,
    config::CompositeWeights,
    error::{MicrostructureError, ensure_finite},
    flow::TradeFlowReport,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PressureSignal {
    StrongBullish,
    Bullish,
    #[default]
    Neutral,
    Bearish,
    StrongBearish,
}

impl PressureSignal {
    pub fn from_score(score: f64) -> Self {
        if score >= 40.0 {
            PressureSignal::StrongBullish
        } else if score >= 30.0 {
            PressureSignal::Bullish
        } else if score <= -40.0 {
            PressureSignal::StrongBearish
        } else if score <= -30.0 {
            PressureSignal::Bearish
        } else {
            PressureSignal::Neutral
        }
    }
}

/// Normalised inputs of the composite score, each in `[-1, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PressureFactors {
    pub micro_skew: f64,
    pub obi_5: f64,
    pub ofi: f64,
    pub depth_ratio: f64,
}

impl PressureFactors {
    pub fn from_reports(book: &OrderBookReport, flow: &TradeFlowReport) -> Self {
        Self {
            micro_skew: book.micro_skew(),
            obi_5: book.obi_5(),
            ofi: (flow.ofi_zscore().value / 2.0).tanh(),
            depth_ratio: book.depth_factor(),
        }
    }
}

/// Contribution of each factor to the score, `weight * factor * 100`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PressureAttribution {
    pub micro_skew: f64,
    pub obi_5: f64,
    pub ofi: f64,
    pub depth_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompositeScore {
    /// In `[-100, 100]`.
    pub value: f64,
    pub signal: PressureSignal,
    pub factors: PressureFactors,
    pub attribution: PressureAttribution,
}

impl Default for CompositeScore {
    fn default() -> Self {
        Self {
            value: 0.0,
            signal: PressureSignal::Neutral,
            factors: PressureFactors::default(),
            attribution: PressureAttribution::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct CompositePressureScorer {
    weights: CompositeWeights,
}

impl CompositePressureScorer {
    pub fn new(weights: CompositeWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, factors: PressureFactors) -> Result<CompositeScore, MicrostructureError> {
        let attribution = PressureAttribution {
            micro_skew: self.weights.micro_skew * factors.micro_skew * 100.0,
            obi_5: self.weights.obi * factors.obi_5 * 100.0,
            ofi: self.weights.ofi * factors.ofi * 100.0,
            depth_ratio: self.weights.depth_ratio * factors.depth_ratio * 100.0,
        };

        let value = attribution.micro_skew + attribution.obi_5 + attribution.ofi + attribution.depth_ratio;
        let value = ensure_finite("composite_pressure_score", value)?.clamp(-100.0, 100.0);

        Ok(CompositeScore {
            value,
            signal: PressureSignal::from_score(value),
            factors,
            attribution,
        })
    }

    pub fn score_reports(
        &self,
        book: &OrderBookReport,
        flow: &TradeFlowReport,
    ) -> Result<CompositeScore, MicrostructureError> {
        self.score(PressureFactors::from_reports(book, flow))
    }
}
