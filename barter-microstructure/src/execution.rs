//! Execution cost simulation: walks each side of the book for a grid of order sizes,
//! producing VWAP, signed slippage and fee-aware break-even prices.
//!
//! Book walking is done in [`Decimal`] so that a 100% order consumes exactly the resting
//! liquidity. Overflow during the walk is reported as
//! [`MicrostructureError::DegenerateArithmetic`].

use crate::{
    book::UnavailableReason,
    config::{ExecutionPolicy, FeeSchedule},
    error::{MicrostructureError, ensure_finite},
    model::{BookSide, InstrumentId, OrderBookLevel, OrderBookSnapshot, Side},
};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One point of a slippage curve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SlippagePoint {
    /// Order size as a percentage of same-side liquidity.
    pub size_pct: f64,
    pub order_size: f64,
    pub vwap: f64,
    /// `(vwap / best - 1) * 100`. Positive for buys, negative for sells.
    pub slippage_pct: f64,
    /// Notional consumed from the book.
    pub total_cost: f64,
    pub levels_consumed: usize,
    /// Buys: minimum exit price. Sells: maximum entry price.
    pub breakeven_price: f64,
    pub profit_needed_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OptimalSize {
    pub size_pct: f64,
    pub order_size: f64,
    pub vwap: f64,
    pub slippage_pct: f64,
    /// Even the smallest tested size breaches the slippage threshold.
    pub high_slippage_warning: bool,
}

/// Slippage curve and size recommendation for orders taking one side of the book.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SideExecution {
    pub side: Side,
    pub curve: Vec<SlippagePoint>,
    /// Tested sizes the book could not fill.
    pub unfilled_size_pcts: Vec<f64>,
    pub optimal: Option<OptimalSize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LiquiditySummary {
    pub total_bid_liquidity: f64,
    pub total_ask_liquidity: f64,
    pub best_bid: f64,
    pub best_ask: f64,
    pub mid_price: f64,
    pub spread: f64,
    pub spread_pct: f64,
}

/// Resting a buy at the best bid as maker and exiting as taker.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PassiveBreakEven {
    pub entry_price: f64,
    pub breakeven_price: f64,
    pub profit_needed_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecutionAnalysis {
    pub liquidity: LiquiditySummary,
    /// Market buys walking the asks.
    pub buy: SideExecution,
    /// Market sells walking the bids.
    pub sell: SideExecution,
    pub passive_buy: PassiveBreakEven,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionReport {
    Unavailable { reason: UnavailableReason },
    Available(Box<ExecutionAnalysis>),
}

impl ExecutionReport {
    pub fn analysis(&self) -> Option<&ExecutionAnalysis> {
        match self {
            ExecutionReport::Unavailable { .. } => None,
            ExecutionReport::Available(analysis) => Some(analysis),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionCostAnalyzer {
    fees: FeeSchedule,
    policy: ExecutionPolicy,
}

impl ExecutionCostAnalyzer {
    pub fn new(fees: FeeSchedule, policy: ExecutionPolicy) -> Self {
        Self { fees, policy }
    }

    pub fn analyze(
        &self,
        instrument: &InstrumentId,
        book: &OrderBookSnapshot,
    ) -> Result<ExecutionReport, MicrostructureError> {
        let (best_bid, best_ask) = match (book.best_bid(), book.best_ask()) {
            (Some(bid), Some(ask)) => (bid.price, ask.price),
            (None, None) => return Ok(unavailable(instrument, UnavailableReason::EmptyBook)),
            (None, Some(_)) => return Ok(unavailable(instrument, UnavailableReason::MissingBids)),
            (Some(_), None) => return Ok(unavailable(instrument, UnavailableReason::MissingAsks)),
        };

        let buy = self.side_execution(instrument, Side::Buy, &book.asks, best_ask)?;
        let sell = self.side_execution(instrument, Side::Sell, &book.bids, best_bid)?;

        let best_bid = to_f64("best bid", best_bid)?;
        let best_ask = to_f64("best ask", best_ask)?;
        let mid_price = (best_bid + best_ask) / 2.0;
        let spread = best_ask - best_bid;

        let liquidity = LiquiditySummary {
            total_bid_liquidity: to_f64("bid liquidity", book.total_quantity(BookSide::Bid))?,
            total_ask_liquidity: to_f64("ask liquidity", book.total_quantity(BookSide::Ask))?,
            best_bid,
            best_ask,
            mid_price,
            spread,
            spread_pct: ensure_finite("execution spread pct", spread / mid_price * 100.0)?,
        };

        let passive_breakeven = ensure_finite(
            "passive break-even",
            best_bid * (1.0 + self.fees.maker_rate()) / (1.0 - self.fees.taker_rate()),
        )?;

        Ok(ExecutionReport::Available(Box::new(ExecutionAnalysis {
            liquidity,
            buy,
            sell,
            passive_buy: PassiveBreakEven {
                entry_price: best_bid,
                breakeven_price: passive_breakeven,
                profit_needed_pct: (passive_breakeven / best_bid - 1.0) * 100.0,
            },
        })))
    }

    fn side_execution(
        &self,
        instrument: &InstrumentId,
        side: Side,
        levels: &[OrderBookLevel],
        best_price: Decimal,
    ) -> Result<SideExecution, MicrostructureError> {
        let total = levels
            .iter()
            .try_fold(Decimal::ZERO, |total, level| total.checked_add(level.quantity))
            .ok_or_else(|| overflow("same-side liquidity"))?;

        let mut curve = Vec::with_capacity(self.policy.size_pcts.len());
        let mut unfilled_size_pcts = Vec::new();

        for &size_pct in &self.policy.size_pcts {
            let order_size = Decimal::from_f64(size_pct)
                .and_then(|pct| total.checked_mul(pct))
                .and_then(|size| size.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(|| overflow("order size"))?;

            match walk(levels, order_size)? {
                Some(fill) => curve.push(self.point(side, size_pct, order_size, best_price, fill)?),
                None => unfilled_size_pcts.push(size_pct),
            }
        }

        if !unfilled_size_pcts.is_empty() {
            debug!(%instrument, %side, ?unfilled_size_pcts, "insufficient liquidity for sizes");
        }

        let optimal = self.optimal(&curve);
        if let Some(optimal) = optimal.as_ref().filter(|optimal| optimal.high_slippage_warning) {
            warn!(
                %instrument,
                %side,
                slippage_pct = optimal.slippage_pct,
                "smallest tested size exceeds slippage threshold"
            );
        }

        Ok(SideExecution {
            side,
            curve,
            unfilled_size_pcts,
            optimal,
        })
    }

    fn point(
        &self,
        side: Side,
        size_pct: f64,
        order_size: Decimal,
        best_price: Decimal,
        fill: Fill,
    ) -> Result<SlippagePoint, MicrostructureError> {
        let vwap = fill
            .cost
            .checked_div(order_size)
            .ok_or_else(|| overflow("vwap"))?;
        let slippage = vwap
            .checked_div(best_price)
            .and_then(|ratio| (ratio - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| overflow("slippage"))?;

        let vwap = to_f64("vwap", vwap)?;
        let fee = self.fees.taker_rate();
        let (breakeven_price, profit_needed_pct) = match side {
            Side::Buy => {
                let breakeven = vwap * (1.0 + fee) / (1.0 - fee);
                (breakeven, (breakeven / vwap - 1.0) * 100.0)
            }
            Side::Sell => {
                let breakeven = vwap * (1.0 - fee) / (1.0 + fee);
                (breakeven, (vwap / breakeven - 1.0) * 100.0)
            }
        };

        Ok(SlippagePoint {
            size_pct,
            order_size: to_f64("order size", order_size)?,
            vwap,
            slippage_pct: to_f64("slippage", slippage)?,
            total_cost: to_f64("total cost", fill.cost)?,
            levels_consumed: fill.levels_consumed,
            breakeven_price: ensure_finite("break-even price", breakeven_price)?,
            profit_needed_pct: ensure_finite("profit needed", profit_needed_pct)?,
        })
    }

    /// Largest size before the first threshold breach, else the smallest size with a warning.
    fn optimal(&self, curve: &[SlippagePoint]) -> Option<OptimalSize> {
        let within = curve
            .iter()
            .take_while(|point| point.slippage_pct.abs() <= self.policy.max_slippage_pct)
            .last();

        let (point, high_slippage_warning) = match within {
            Some(point) => (point, false),
            None => (curve.first()?, true),
        };

        Some(OptimalSize {
            size_pct: point.size_pct,
            order_size: point.order_size,
            vwap: point.vwap,
            slippage_pct: point.slippage_pct,
            high_slippage_warning,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Fill {
    cost: Decimal,
    levels_consumed: usize,
}

/// Consume `levels` best-first until `size` is filled. `None` if the book runs out first
/// or `size` is not positive.
fn walk(levels: &[OrderBookLevel], size: Decimal) -> Result<Option<Fill>, MicrostructureError> {
    if size <= Decimal::ZERO {
        return Ok(None);
    }

    let mut remaining = size;
    let mut cost = Decimal::ZERO;
    let mut levels_consumed = 0;

    for level in levels {
        if remaining <= Decimal::ZERO {
            break;
        }
        let executed = remaining.min(level.quantity);
        cost = executed
            .checked_mul(level.price)
            .and_then(|notional| cost.checked_add(notional))
            .ok_or_else(|| overflow("book walk"))?;
        remaining -= executed;
        levels_consumed += 1;
    }

    Ok((remaining <= Decimal::ZERO).then_some(Fill {
        cost,
        levels_consumed,
    }))
}

fn unavailable(instrument: &InstrumentId, reason: UnavailableReason) -> ExecutionReport {
    debug!(%instrument, ?reason, "execution cost unavailable");
    ExecutionReport::Unavailable { reason }
}

fn overflow(context: &str) -> MicrostructureError {
    MicrostructureError::DegenerateArithmetic(format!("{context} overflowed"))
}

fn to_f64(context: &str, value: Decimal) -> Result<f64, MicrostructureError> {
    value
        .to_f64()
        .ok_or_else(|| {
            MicrostructureError::DegenerateArithmetic(format!("{context} not representable"))
        })
        .and_then(|value| ensure_finite(context, value))
}
