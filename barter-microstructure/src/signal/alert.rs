use super::{Action, Recommendation, SignalInputs};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    BullishPressure,
    BearishPressure,
    AggressiveBuying,
    AggressiveSelling,
    BuyStopCascade,
    SellStopCascade,
    MicroSkewExtreme,
    SpreadWidening,
    Manipulation,
    Avoid,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    /// Reading that tripped the threshold.
    pub value: f64,
}

impl Alert {
    fn new(kind: AlertKind, severity: Severity, value: f64, message: String) -> Self {
        Self {
            kind,
            severity,
            message,
            value,
        }
    }
}

/// Evaluate every threshold independently. Alerts are returned in a fixed check order and
/// several may fire at once.
pub fn collect(inputs: &SignalInputs<'_>, recommendation: &Recommendation) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let cps = inputs.composite.value;
    if cps >= 40.0 {
        alerts.push(Alert::new(
            AlertKind::BullishPressure,
            Severity::High,
            cps,
            format!("Strong bullish pressure detected (CPS {cps:.1})"),
        ));
    } else if cps <= -40.0 {
        alerts.push(Alert::new(
            AlertKind::BearishPressure,
            Severity::High,
            cps,
            format!("Strong bearish pressure detected (CPS {cps:.1})"),
        ));
    }

    let ofi_z = inputs.flow.ofi_zscore().value;
    if ofi_z >= 1.5 {
        alerts.push(Alert::new(
            AlertKind::AggressiveBuying,
            Severity::High,
            ofi_z,
            format!("Extreme aggressive buying (OFI z {ofi_z:.2})"),
        ));
    } else if ofi_z <= -1.5 {
        alerts.push(Alert::new(
            AlertKind::AggressiveSelling,
            Severity::High,
            ofi_z,
            format!("Extreme aggressive selling (OFI z {ofi_z:.2})"),
        ));
    }

    let (sri_buy, sri_sell) = inputs.book.stop_risk();
    if sri_buy >= 70.0 {
        alerts.push(Alert::new(
            AlertKind::BuyStopCascade,
            Severity::Critical,
            sri_buy,
            format!("High stop-loss cascade risk on buy side (SRI {sri_buy:.1})"),
        ));
    }
    if sri_sell >= 70.0 {
        alerts.push(Alert::new(
            AlertKind::SellStopCascade,
            Severity::Critical,
            sri_sell,
            format!("High stop-loss cascade risk on sell side (SRI {sri_sell:.1})"),
        ));
    }

    let skew = inputs.book.micro_skew();
    if skew.abs() >= 0.8 {
        alerts.push(Alert::new(
            AlertKind::MicroSkewExtreme,
            Severity::Medium,
            skew,
            format!("Microprice pinned to one side of the spread (skew {skew:.2})"),
        ));
    }

    let spread_z = inputs.book.spread_zscore().value;
    if spread_z >= 1.5 {
        alerts.push(Alert::new(
            AlertKind::SpreadWidening,
            Severity::Medium,
            spread_z,
            format!("Abnormal spread widening (z {spread_z:.2})"),
        ));
    }

    let manipulation = inputs.bandarmology.manipulation_score();
    let manipulation_severity = if manipulation >= 70.0 {
        Some(Severity::Critical)
    } else if manipulation >= 50.0 {
        Some(Severity::High)
    } else {
        None
    };
    if let Some(severity) = manipulation_severity {
        alerts.push(Alert::new(
            AlertKind::Manipulation,
            severity,
            manipulation,
            format!("Manipulation detected ({manipulation:.1}/100)"),
        ));
    }

    if recommendation.action == Action::Avoid {
        alerts.push(Alert::new(
            AlertKind::Avoid,
            Severity::Critical,
            recommendation.overall_score,
            "Recommendation forced to AVOID".to_string(),
        ));
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bandarmology::BandarmologyReport,
        book::{OrderBookAnalyzer, OrderBookReport, UnavailableReason},
        composite::CompositeScore,
        flow::{CvdReport, CvdTotals, OfiReport, TradeFlowReport},
        model::{InstrumentId, OrderBookLevel, OrderBookSnapshot},
        signal::ExternalScores,
        stats::RollingStatTracker,
    };
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn empty_flow() -> TradeFlowReport {
        TradeFlowReport::Empty {
            cvd: CvdReport::empty(CvdTotals::default()),
            ofi: OfiReport::empty(10),
        }
    }

    #[test]
    fn test_quiet_inputs_raise_nothing() {
        let book = OrderBookReport::Unavailable {
            reason: UnavailableReason::EmptyBook,
        };
        let flow = empty_flow();
        let composite = CompositeScore::default();
        let bandarmology = BandarmologyReport::Unavailable {
            reason: UnavailableReason::EmptyBook,
        };
        let external = ExternalScores::default();
        let inputs = SignalInputs {
            book: &book,
            flow: &flow,
            composite: &composite,
            bandarmology: &bandarmology,
            context: None,
            external: &external,
        };

        assert!(collect(&inputs, &Recommendation::default()).is_empty());
    }

    #[test]
    fn test_alerts_fire_in_order() {
        // Heavy top bid pins microprice to the ask and leaves a thin single-level book
        let id = InstrumentId::new("x");
        let snapshot = OrderBookSnapshot::new(
            id.clone(),
            vec![OrderBookLevel::new(dec!(100), dec!(50)).unwrap()],
            vec![OrderBookLevel::new(dec!(101), dec!(0.1)).unwrap()],
        );
        let book = OrderBookAnalyzer::new(Arc::new(RollingStatTracker::default()))
            .analyze(&id, &snapshot)
            .unwrap();

        let flow = empty_flow();
        let composite = CompositeScore {
            value: 45.0,
            ..CompositeScore::default()
        };
        let bandarmology = BandarmologyReport::Unavailable {
            reason: UnavailableReason::EmptyBook,
        };
        let external = ExternalScores::default();
        let inputs = SignalInputs {
            book: &book,
            flow: &flow,
            composite: &composite,
            bandarmology: &bandarmology,
            context: None,
            external: &external,
        };
        let recommendation = Recommendation {
            action: Action::Avoid,
            ..Recommendation::default()
        };

        let kinds = collect(&inputs, &recommendation)
            .into_iter()
            .map(|alert| alert.kind)
            .collect::<Vec<_>>();

        assert_eq!(
            kinds,
            vec![
                AlertKind::BullishPressure,
                AlertKind::BuyStopCascade,
                AlertKind::MicroSkewExtreme,
                AlertKind::Avoid,
            ]
        );
    }
}
