use super::{
    Side,
    raw::{RawTrade, decimal_from_value, timestamp_from_value},
};
use crate::error::MicrostructureError;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::debug;

/// Executed trade with the aggressor [`Side`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Trade {
    /// Unix seconds.
    pub timestamp: i64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    pub id: Option<SmolStr>,
}

impl Trade {
    pub fn price_f64(&self) -> f64 {
        self.price.to_f64().unwrap_or(0.0)
    }

    pub fn quantity_f64(&self) -> f64 {
        self.quantity.to_f64().unwrap_or(0.0)
    }

    /// `+quantity` for buys, `-quantity` for sells.
    pub fn signed_quantity(&self) -> f64 {
        self.side.sign() * self.quantity_f64()
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

impl TryFrom<&RawTrade> for Trade {
    type Error = MicrostructureError;

    fn try_from(raw: &RawTrade) -> Result<Self, Self::Error> {
        let side = match raw.kind.as_str().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("buy") => Side::Buy,
            Some(kind) if kind.eq_ignore_ascii_case("sell") => Side::Sell,
            _ => {
                return Err(MicrostructureError::MalformedRecord(format!(
                    "unknown trade type: {}",
                    raw.kind
                )));
            }
        };

        let price = decimal_from_value(&raw.price)?;
        if price <= Decimal::ZERO {
            return Err(MicrostructureError::MalformedRecord(format!(
                "trade price must be positive, got {price}"
            )));
        }

        let quantity = decimal_from_value(&raw.amount)?;
        if quantity < Decimal::ZERO {
            return Err(MicrostructureError::MalformedRecord(format!(
                "trade amount must be non-negative, got {quantity}"
            )));
        }

        let id = match &raw.tid {
            Value::String(tid) => Some(SmolStr::new(tid)),
            Value::Number(tid) => Some(SmolStr::new(tid.to_string())),
            _ => None,
        };

        Ok(Self {
            timestamp: timestamp_from_value(&raw.date)?,
            price,
            quantity,
            side,
            id,
        })
    }
}

/// Trades ordered oldest to newest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TradeTape {
    trades: Vec<Trade>,
}

impl TradeTape {
    /// Sort by timestamp. Trades sharing a timestamp keep their source order.
    pub fn new(mut trades: Vec<Trade>) -> Self {
        trades.sort_by_key(|trade| trade.timestamp);
        Self { trades }
    }

    /// Parse raw trade records, skipping any record that fails to parse.
    pub fn from_raw(raw: &[RawTrade]) -> Self {
        let trades = raw
            .iter()
            .filter_map(|record| match Trade::try_from(record) {
                Ok(trade) => Some(trade),
                Err(error) => {
                    debug!(%error, "skipping malformed trade record");
                    None
                }
            })
            .collect();

        Self::new(trades)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Most recent `n` trades, oldest first.
    pub fn recent(&self, n: usize) -> &[Trade] {
        &self.trades[self.trades.len().saturating_sub(n)..]
    }

    pub fn last(&self) -> Option<&Trade> {
        self.trades.last()
    }
}
