//! One-call orchestration of every analyzer over a raw market snapshot.
//!
//! Per-instrument state (rolling histories and CVD totals) lives in the injected
//! [`RollingStatTracker`] and [`CvdTracker`], so several engines, or several threads sharing
//! one engine, observe the same history.

use crate::{
    bandarmology::{BandarmologyReport, ManipulationDetector},
    book::{OrderBookAnalyzer, OrderBookReport, UnavailableReason},
    composite::{CompositePressureScorer, CompositeScore},
    config::EngineConfig,
    error::MicrostructureError,
    execution::{ExecutionCostAnalyzer, ExecutionReport},
    flow::{CvdReport, CvdTracker, OfiReport, TradeFlowAnalyzer, TradeFlowReport},
    model::{
        InstrumentId, MarketContext, OrderBookSnapshot, RawOrderBook, RawTrade, Trade, TradeTape,
    },
    signal::{Alert, ExternalScores, Recommendation, SignalAggregator, SignalInputs, alert},
    stats::RollingStatTracker,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything the engine needs for one analysis pass, as delivered by the market-data
/// collaborator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawMarketInput {
    pub instrument_id: InstrumentId,
    #[serde(default)]
    pub order_book: RawOrderBook,
    #[serde(default)]
    pub trades: Vec<RawTrade>,
    #[serde(default)]
    pub context: Option<MarketContext>,
    #[serde(default)]
    pub external: ExternalScores,
}

/// Result of one analysis pass.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketAnalysis {
    pub instrument: InstrumentId,
    /// Time of the latest parsed trade.
    pub as_of: Option<DateTime<Utc>>,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub trades: usize,
    pub order_book: OrderBookReport,
    pub trade_flow: TradeFlowReport,
    pub composite: CompositeScore,
    pub bandarmology: BandarmologyReport,
    pub execution: ExecutionReport,
    pub recommendation: Recommendation,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone)]
pub struct MicrostructureEngine {
    config: EngineConfig,
    stats: Arc<RollingStatTracker>,
    cvd: Arc<CvdTracker>,
    trade_flow: TradeFlowAnalyzer,
    order_book: OrderBookAnalyzer,
    composite: CompositePressureScorer,
    manipulation: ManipulationDetector,
    execution: ExecutionCostAnalyzer,
    signal: SignalAggregator,
}

impl MicrostructureEngine {
    /// Construct an engine with fresh per-instrument state.
    pub fn new(config: EngineConfig) -> Result<Self, MicrostructureError> {
        let stats = Arc::new(RollingStatTracker::new(
            config.history_capacity,
            config.min_zscore_samples,
        ));
        Self::with_state(config, stats, Arc::new(CvdTracker::default()))
    }

    /// Construct an engine over existing per-instrument state.
    pub fn with_state(
        config: EngineConfig,
        stats: Arc<RollingStatTracker>,
        cvd: Arc<CvdTracker>,
    ) -> Result<Self, MicrostructureError> {
        config.validate()?;

        Ok(Self {
            trade_flow: TradeFlowAnalyzer::new(&config, Arc::clone(&stats), Arc::clone(&cvd)),
            order_book: OrderBookAnalyzer::new(Arc::clone(&stats)),
            composite: CompositePressureScorer::new(config.composite),
            manipulation: ManipulationDetector::new(config.manipulation),
            execution: ExecutionCostAnalyzer::new(config.fees, config.execution.clone()),
            signal: SignalAggregator::new(config.signal),
            config,
            stats,
            cvd,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<RollingStatTracker> {
        &self.stats
    }

    pub fn cvd(&self) -> &Arc<CvdTracker> {
        &self.cvd
    }

    /// Run every analyzer over `input`. Never fails: an analyzer error is logged and its
    /// report replaced by the neutral variant.
    pub fn analyze(&self, input: &RawMarketInput) -> MarketAnalysis {
        let instrument = &input.instrument_id;
        let book = OrderBookSnapshot::from_raw(instrument.clone(), &input.order_book);
        let tape = TradeTape::from_raw(&input.trades);
        let context = input.context.as_ref();

        let order_book = or_neutral(
            instrument,
            "order_book",
            self.order_book.analyze(instrument, &book),
            || OrderBookReport::Unavailable {
                reason: UnavailableReason::Degenerate,
            },
        );

        let trade_flow = or_neutral(
            instrument,
            "trade_flow",
            self.trade_flow.analyze(instrument, &tape),
            || TradeFlowReport::Empty {
                cvd: CvdReport::empty(self.cvd.get(instrument)),
                ofi: OfiReport::empty(self.config.ofi_window),
            },
        );

        let composite = or_neutral(
            instrument,
            "composite",
            self.composite.score_reports(&order_book, &trade_flow),
            CompositeScore::default,
        );

        let bandarmology = or_neutral(
            instrument,
            "bandarmology",
            self.manipulation.analyze(instrument, &book, &tape, context),
            || BandarmologyReport::Unavailable {
                reason: UnavailableReason::Degenerate,
            },
        );

        let execution = or_neutral(
            instrument,
            "execution",
            self.execution.analyze(instrument, &book),
            || ExecutionReport::Unavailable {
                reason: UnavailableReason::Degenerate,
            },
        );

        let inputs = SignalInputs {
            book: &order_book,
            flow: &trade_flow,
            composite: &composite,
            bandarmology: &bandarmology,
            context,
            external: &input.external,
        };
        let recommendation = or_neutral(
            instrument,
            "signal",
            self.signal.recommend(&inputs),
            Recommendation::default,
        );
        let alerts = alert::collect(&inputs, &recommendation);

        info!(
            %instrument,
            trades = tape.len(),
            cps = composite.value,
            manipulation = bandarmology.manipulation_score(),
            action = %recommendation.action,
            score = recommendation.overall_score,
            alerts = alerts.len(),
            "microstructure analysis complete"
        );

        MarketAnalysis {
            instrument: instrument.clone(),
            as_of: tape.last().and_then(Trade::time),
            bid_levels: book.bids.len(),
            ask_levels: book.asks.len(),
            trades: tape.len(),
            order_book,
            trade_flow,
            composite,
            bandarmology,
            execution,
            recommendation,
            alerts,
        }
    }
}

fn or_neutral<T>(
    instrument: &InstrumentId,
    component: &'static str,
    result: Result<T, MicrostructureError>,
    neutral: impl FnOnce() -> T,
) -> T {
    match result {
        Ok(report) => report,
        Err(err) if err.is_recoverable() => {
            warn!(%instrument, component, %err, "analyzer degraded to neutral report");
            neutral()
        }
        Err(err) => {
            error!(%instrument, component, %err, "analyzer failed, reporting neutral result");
            neutral()
        }
    }
}
