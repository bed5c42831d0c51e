use super::calc;
use crate::model::{Confidence, InstrumentId};
use fnv::FnvHashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, sync::Arc};
use tracing::debug;

/// Default number of observations retained per series.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Default number of observations a series must exceed before z-scores are reported.
pub const DEFAULT_MIN_ZSCORE_SAMPLES: usize = 10;

/// Metrics normalised against their own rolling history.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    OrderFlowImbalance,
    LogDepthRatio,
    SpreadPct,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::OrderFlowImbalance => "ofi",
            Metric::LogDepthRatio => "log_dratio",
            Metric::SpreadPct => "spread_pct",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bounded FIFO window of observations.
#[derive(Debug, Clone)]
pub struct RollingSeries {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RollingSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
        }
    }

    /// Append a value, evicting the oldest once at capacity. Non-finite values are ignored.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    fn zscore(&self, value: f64, min_samples: usize) -> ZScore {
        let samples = self.values.len();
        if samples <= min_samples {
            return ZScore::neutral(samples, min_samples);
        }

        let history = self.values.iter().copied().collect::<Vec<_>>();
        match calc::zscore(value, &history) {
            Some(z) if z.is_finite() => ZScore {
                value: z,
                samples,
                confidence: ZScore::confidence_for(samples, min_samples),
            },
            _ => ZScore::neutral(samples, min_samples),
        }
    }
}

/// Standardised reading of a value against its rolling history.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct ZScore {
    pub value: f64,
    /// Size of the history the score was computed over.
    pub samples: usize,
    pub confidence: Confidence,
}

impl ZScore {
    fn neutral(samples: usize, min_samples: usize) -> Self {
        Self {
            value: 0.0,
            samples,
            confidence: Self::confidence_for(samples, min_samples),
        }
    }

    fn confidence_for(samples: usize, min_samples: usize) -> Confidence {
        if samples <= min_samples {
            Confidence::Low
        } else if samples < 100 {
            Confidence::Medium
        } else {
            Confidence::High
        }
    }
}

impl Default for ZScore {
    fn default() -> Self {
        Self::neutral(0, DEFAULT_MIN_ZSCORE_SAMPLES)
    }
}

type SeriesKey = (InstrumentId, Metric);

/// Per-instrument, per-metric rolling histories.
///
/// Each `(instrument, metric)` series sits behind its own lock, so concurrent passes for
/// different instruments never contend and passes for the same instrument are serialised
/// per series.
#[derive(Debug)]
pub struct RollingStatTracker {
    capacity: usize,
    min_samples: usize,
    series: RwLock<FnvHashMap<SeriesKey, Arc<Mutex<RollingSeries>>>>,
}

impl Default for RollingStatTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, DEFAULT_MIN_ZSCORE_SAMPLES)
    }
}

impl RollingStatTracker {
    pub fn new(capacity: usize, min_samples: usize) -> Self {
        Self {
            capacity,
            min_samples,
            series: RwLock::new(FnvHashMap::default()),
        }
    }

    fn series(&self, instrument: &InstrumentId, metric: Metric) -> Arc<Mutex<RollingSeries>> {
        let key = (instrument.clone(), metric);

        if let Some(series) = self.series.read().get(&key) {
            return Arc::clone(series);
        }

        let mut map = self.series.write();
        let series = map.entry(key).or_insert_with(|| {
            debug!(%instrument, %metric, capacity = self.capacity, "creating rolling series");
            Arc::new(Mutex::new(RollingSeries::new(self.capacity)))
        });
        Arc::clone(series)
    }

    /// Append a value to the series.
    pub fn observe(&self, instrument: &InstrumentId, metric: Metric, value: f64) {
        self.series(instrument, metric).lock().push(value);
    }

    /// Score `value` against the currently stored series without observing it.
    pub fn zscore(&self, instrument: &InstrumentId, metric: Metric, value: f64) -> ZScore {
        self.series(instrument, metric)
            .lock()
            .zscore(value, self.min_samples)
    }

    /// Observe `value` and score it against a history that includes it, under one lock.
    pub fn record(&self, instrument: &InstrumentId, metric: Metric, value: f64) -> ZScore {
        let series = self.series(instrument, metric);
        let mut series = series.lock();
        series.push(value);
        series.zscore(value, self.min_samples)
    }

    /// Observe every value in order, then score the last one, under one lock.
    ///
    /// Returns a neutral score if `values` is empty.
    pub fn record_many(&self, instrument: &InstrumentId, metric: Metric, values: &[f64]) -> ZScore {
        let series = self.series(instrument, metric);
        let mut series = series.lock();
        values.iter().for_each(|value| series.push(*value));

        match values.last() {
            Some(last) => series.zscore(*last, self.min_samples),
            None => ZScore::neutral(series.len(), self.min_samples),
        }
    }

    /// Number of observations currently held for a series.
    pub fn len(&self, instrument: &InstrumentId, metric: Metric) -> usize {
        let key = (instrument.clone(), metric);
        self.series
            .read()
            .get(&key)
            .map(|series| series.lock().len())
            .unwrap_or(0)
    }

    /// Number of series created so far.
    pub fn series_count(&self) -> usize {
        self.series.read().len()
    }
}
