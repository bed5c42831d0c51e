//! Final recommendation and threshold alerts built from every analyzer's report.

use crate::{
    bandarmology::BandarmologyReport,
    book::OrderBookReport,
    composite::CompositeScore,
    flow::TradeFlowReport,
    model::{Confidence, MarketContext, RiskLevel},
};
use serde::{Deserialize, Serialize};

/// Weighted component blend, manipulation override and risk assessment.
pub mod aggregator;

/// Independent threshold alerts.
pub mod alert;

pub use aggregator::SignalAggregator;
pub use alert::{Alert, AlertKind, Severity};

/// Scores produced by collaborators outside the engine (technical indicators, sentiment).
///
/// Each score is on a `[0, 100]` scale where 50 is neutral.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExternalScores {
    pub technical_score: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_confidence: Option<Confidence>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
    /// Forced by the manipulation override.
    Avoid,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::StrongBuy => "STRONG_BUY",
            Action::Buy => "BUY",
            Action::Hold => "HOLD",
            Action::Sell => "SELL",
            Action::StrongSell => "STRONG_SELL",
            Action::Avoid => "AVOID",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-component scores, each in `[0, 100]`.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComponentScores {
    pub microstructure: f64,
    pub trade_flow: f64,
    pub bandarmology: f64,
    pub sentiment: f64,
    pub technical: f64,
}

impl Default for ComponentScores {
    fn default() -> Self {
        Self {
            microstructure: 50.0,
            trade_flow: 50.0,
            bandarmology: 50.0,
            sentiment: 50.0,
            technical: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Recommendation {
    pub action: Action,
    pub confidence: Confidence,
    /// Weighted blend of the component scores, in `[0, 100]`.
    pub overall_score: f64,
    pub components: ComponentScores,
    /// The action was forced to [`Action::Avoid`] by the manipulation score.
    pub manipulation_override: bool,
    pub risk: RiskAssessment,
    pub quick_insight: String,
}

impl Default for Recommendation {
    fn default() -> Self {
        Self {
            action: Action::Hold,
            confidence: Confidence::Low,
            overall_score: 50.0,
            components: ComponentScores::default(),
            manipulation_override: false,
            risk: RiskAssessment::default(),
            quick_insight: "Insufficient data for analysis".to_string(),
        }
    }
}

/// Borrowed view of every report feeding the recommendation.
#[derive(Debug, Copy, Clone)]
pub struct SignalInputs<'a> {
    pub book: &'a OrderBookReport,
    pub flow: &'a TradeFlowReport,
    pub composite: &'a CompositeScore,
    pub bandarmology: &'a BandarmologyReport,
    pub context: Option<&'a MarketContext>,
    pub external: &'a ExternalScores,
}
