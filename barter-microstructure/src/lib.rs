#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity)]

//! # Barter-Microstructure
//! Market microstructure analytics over order book snapshots and trade tapes.
//!
//! One [`MicrostructureEngine::analyze`] call turns a raw snapshot into:
//! - **Trade flow**: cumulative volume delta, order flow imbalance (z-scored), Kyle's lambda,
//!   buy/sell ratios and aggressive pressure.
//! - **Order book**: microprice skew, multi-level imbalance, depth ratio (z-scored), liquidity
//!   vacuum, spread regime and a stop-cascade proxy.
//! - **Composite pressure score** blending the above into `[-100, 100]`.
//! - **Bandarmology**: fake order scoring, whale concentration, market maker behaviour and a
//!   manipulation verdict.
//! - **Execution cost**: slippage curves and fee-aware break-even prices.
//! - **Recommendation** and threshold alerts, with a manipulation override.
//!
//! Per-instrument rolling state is held in an injected [`RollingStatTracker`] and
//! [`CvdTracker`](flow::CvdTracker). Nothing is persisted across process restarts.
//!
//! ```rust,no_run
//! use barter_microstructure::{EngineConfig, MicrostructureEngine, RawMarketInput};
//!
//! let engine = MicrostructureEngine::new(EngineConfig::default()).unwrap();
//! let input: RawMarketInput = serde_json::from_str(r#"{
//!     "instrument_id": "btc_idr",
//!     "order_book": { "buy": [["100", "2"]], "sell": [["101", "1"]] },
//!     "trades": [{ "date": 1700000000, "price": "100.5", "amount": "0.3", "type": "buy" }]
//! }"#).unwrap();
//!
//! let analysis = engine.analyze(&input);
//! println!("{}", analysis.recommendation.action);
//! ```

/// Order authenticity, whale and market maker analysis combined into a manipulation verdict.
pub mod bandarmology;

/// Order book analytics.
pub mod book;

/// Composite pressure score.
pub mod composite;

/// Engine configuration and policy weights.
pub mod config;

/// One-call orchestration of every analyzer.
pub mod engine;

/// All [`Error`](std::error::Error)s generated in Barter-Microstructure.
pub mod error;

/// Execution cost simulation.
pub mod execution;

/// Trade tape analytics.
pub mod flow;

/// Typed market data models and raw payload parsing.
pub mod model;

/// Recommendation and alerts.
pub mod signal;

/// Numeric helpers and per-instrument rolling statistics.
pub mod stats;

pub use config::EngineConfig;
pub use engine::{MarketAnalysis, MicrostructureEngine, RawMarketInput};
pub use error::MicrostructureError;
pub use model::{InstrumentId, MarketContext};
pub use stats::RollingStatTracker;
