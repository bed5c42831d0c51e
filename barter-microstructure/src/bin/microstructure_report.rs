//! Analyse one or more raw market snapshots from a JSON file and print the results as JSON.
//!
//! Usage: `microstructure-report <input.json>`
//!
//! The input is either a single `RawMarketInput` object or an array of them. Arrays are
//! analysed in order against one engine, so later snapshots of an instrument see the
//! rolling history and CVD accumulated by earlier ones. Configuration is taken from the
//! `MICRO_*` environment variables.

use barter_microstructure::{EngineConfig, MarketAnalysis, MicrostructureEngine, RawMarketInput};
use serde::Deserialize;
use std::error::Error;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReportInput {
    Single(Box<RawMarketInput>),
    Batch(Vec<RawMarketInput>),
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let Some(path) = std::env::args().nth(1) else {
        error!("missing input path, usage: microstructure-report <input.json>");
        return Err("missing input path".into());
    };

    let config = EngineConfig::from_env()?;
    let engine = MicrostructureEngine::new(config)?;

    let raw = std::fs::read_to_string(&path)?;
    let output = match serde_json::from_str::<ReportInput>(&raw)? {
        ReportInput::Single(input) => {
            info!(%path, instrument = %input.instrument_id, "analysing market snapshot");
            serde_json::to_string_pretty(&engine.analyze(&input))?
        }
        ReportInput::Batch(inputs) => {
            info!(%path, snapshots = inputs.len(), "analysing market snapshots");
            let analyses = inputs
                .iter()
                .map(|input| engine.analyze(input))
                .collect::<Vec<MarketAnalysis>>();
            serde_json::to_string_pretty(&analyses)?
        }
    };
    println!("{output}");

    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
