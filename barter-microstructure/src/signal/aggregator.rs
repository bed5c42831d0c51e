use super::{Action, ComponentScores, RiskAssessment, Recommendation, SignalInputs};
use crate::{
    config::SignalWeights,
    error::{MicrostructureError, ensure_finite},
    model::{Confidence, Direction, RiskLevel},
};
use tracing::debug;

/// Risk score bands for [`RiskLevel::Medium`], `High` and `VeryHigh`.
const RISK_BANDS: [f64; 3] = [30.0, 50.0, 70.0];

#[derive(Debug, Copy, Clone, Default)]
pub struct SignalAggregator {
    weights: SignalWeights,
}

impl SignalAggregator {
    pub fn new(weights: SignalWeights) -> Self {
        Self { weights }
    }

    pub fn recommend(&self, inputs: &SignalInputs<'_>) -> Result<Recommendation, MicrostructureError> {
        let components = component_scores(inputs);
        let overall_score = self.blend(&components)?;
        let manipulation = inputs.bandarmology.manipulation_score();

        let weak_support = inputs.flow.ofi_zscore().confidence == Confidence::Low
            || inputs.external.sentiment_confidence == Some(Confidence::Low);

        let (action, confidence, manipulation_override) =
            self.decide(overall_score, manipulation, weak_support);
        if manipulation_override {
            debug!(manipulation, overall_score, "manipulation override forced AVOID");
        }

        let risk = assess_risk(inputs);

        Ok(Recommendation {
            quick_insight: quick_insight(action, risk.level),
            action,
            confidence,
            overall_score,
            components,
            manipulation_override,
            risk,
        })
    }

    /// Weighted sum of the component scores.
    pub fn blend(&self, components: &ComponentScores) -> Result<f64, MicrostructureError> {
        let score = components.microstructure * self.weights.microstructure
            + components.trade_flow * self.weights.trade_flow
            + components.bandarmology * self.weights.bandarmology
            + components.sentiment * self.weights.sentiment
            + components.technical * self.weights.technical;

        Ok(ensure_finite("overall score", score)?.clamp(0.0, 100.0))
    }

    /// Action and confidence for a blended score. Returns `true` when the manipulation
    /// override applied, which takes precedence over the score.
    pub fn decide(
        &self,
        overall_score: f64,
        manipulation_score: f64,
        weak_support: bool,
    ) -> (Action, Confidence, bool) {
        if manipulation_score >= self.weights.manipulation_override {
            return (Action::Avoid, Confidence::High, true);
        }

        let (action, confidence) = if overall_score >= 75.0 {
            let confidence = if overall_score >= 85.0 {
                Confidence::High
            } else {
                Confidence::Medium
            };
            (Action::StrongBuy, confidence)
        } else if overall_score >= 60.0 {
            (Action::Buy, Confidence::Medium)
        } else if overall_score >= 40.0 {
            (Action::Hold, Confidence::Medium)
        } else if overall_score >= 25.0 {
            (Action::Sell, Confidence::Medium)
        } else {
            let confidence = if overall_score <= 15.0 {
                Confidence::High
            } else {
                Confidence::Medium
            };
            (Action::StrongSell, confidence)
        };

        let confidence = if weak_support {
            confidence.downgrade()
        } else {
            confidence
        };

        (action, confidence, false)
    }
}

fn direction_score(direction: Direction) -> f64 {
    match direction {
        Direction::Bullish => 70.0,
        Direction::Neutral => 50.0,
        Direction::Bearish => 30.0,
    }
}

pub fn component_scores(inputs: &SignalInputs<'_>) -> ComponentScores {
    let microstructure = (inputs.composite.value + 100.0) / 2.0;

    let ofi_score = (50.0 + 10.0 * inputs.flow.ofi_zscore().value).clamp(0.0, 100.0);
    let trade_flow = 0.6 * ofi_score + 0.4 * direction_score(inputs.flow.cvd_trend());

    let real_direction = inputs
        .bandarmology
        .real_direction()
        .map(|real| real.direction)
        .unwrap_or_default();
    let bandarmology = (direction_score(real_direction)
        - inputs.bandarmology.manipulation_score() / 2.0)
        .clamp(0.0, 100.0);

    let sentiment = inputs
        .external
        .sentiment_score
        .filter(|score| score.is_finite())
        .map(|score| score.clamp(0.0, 100.0))
        .unwrap_or(50.0);

    let technical = inputs
        .external
        .technical_score
        .filter(|score| score.is_finite())
        .map(|score| score.clamp(0.0, 100.0))
        .or_else(|| {
            inputs
                .context
                .and_then(|context| context.range_position())
                .map(|position| position * 100.0)
        })
        .unwrap_or(50.0);

    ComponentScores {
        microstructure,
        trade_flow,
        bandarmology,
        sentiment,
        technical,
    }
}

pub fn assess_risk(inputs: &SignalInputs<'_>) -> RiskAssessment {
    let mut score = 0.0;
    let mut factors = Vec::new();

    let manipulation = inputs.bandarmology.manipulation_score();
    if manipulation >= 50.0 {
        score += 0.4 * manipulation;
        factors.push(format!("Manipulation score {manipulation:.1}"));
    }

    let spread_z = inputs.book.spread_zscore().value;
    if spread_z.abs() >= 1.5 {
        score += 15.0;
        factors.push(format!("Abnormal spread (z {spread_z:.2})"));
    }

    let (sri_buy, sri_sell) = inputs.book.stop_risk();
    if sri_buy >= 70.0 || sri_sell >= 70.0 {
        score += 20.0;
        factors.push("High stop-loss cascade risk".to_string());
    }

    let ofi_z = inputs.flow.ofi_zscore().value;
    if ofi_z.abs() >= 2.0 {
        score += 10.0;
        factors.push(format!("Extreme order flow (z {ofi_z:.2})"));
    }

    RiskAssessment {
        score,
        level: RiskLevel::from_thresholds(score, RISK_BANDS),
        factors,
    }
}

fn quick_insight(action: Action, risk: RiskLevel) -> String {
    let insight = match action {
        Action::StrongBuy => "Strong buy signal",
        Action::Buy => "Moderate buy opportunity",
        Action::Hold => "Hold position, wait for clarity",
        Action::Sell => "Consider taking profits",
        Action::StrongSell => "Strong sell signal",
        Action::Avoid => "Manipulation detected, stay out",
    };
    format!("{insight} (risk {})", risk.as_str())
}
