//! Typed market data models parsed from raw exchange payloads.
//!
//! Raw levels and trades arrive as loosely typed JSON (strings or numbers, arrays or objects).
//! Everything downstream of this module works on validated [`OrderBookSnapshot`] and
//! [`TradeTape`] values only.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Order book snapshot and level types.
pub mod book;

/// Raw exchange payload shapes and lenient scalar parsing.
pub mod raw;

/// Trade and trade tape types.
pub mod trade;

pub use book::{BookSide, OrderBookLevel, OrderBookSnapshot, TopOfBook};
pub use raw::{RawOrderBook, RawTrade};
pub use trade::{Trade, TradeTape};

/// Identifier of the instrument (trading pair) an analysis pass belongs to, eg/ "btc_idr".
#[derive(
    Clone, Debug, Display, From, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub struct InstrumentId(pub SmolStr);

impl InstrumentId {
    pub fn new(id: &str) -> Self {
        Self(SmolStr::new(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for InstrumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Aggressor side of a trade, or resting side of an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Side::Sell)
    }

    /// Signed multiplier: +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directional read shared by several analyzers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Direction {
    /// Classify two opposing volumes, requiring one side to exceed the other by `ratio`.
    pub fn from_volumes(buy: f64, sell: f64, ratio: f64) -> Self {
        if buy > sell * ratio {
            Direction::Bullish
        } else if sell > buy * ratio {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "BULLISH",
            Direction::Bearish => "BEARISH",
            Direction::Neutral => "NEUTRAL",
        }
    }
}

/// Confidence marker attached to sample-size dependent results.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    /// One step lower, saturating at [`Confidence::Low`].
    pub fn downgrade(self) -> Self {
        match self {
            Confidence::High => Confidence::Medium,
            Confidence::Medium | Confidence::Low => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }
}

/// Four step graded level used for manipulation, whale activity and overall risk.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Grade `value` against ascending `[medium, high, very_high]` thresholds (inclusive).
    pub fn from_thresholds(value: f64, [medium, high, very_high]: [f64; 3]) -> Self {
        if value >= very_high {
            RiskLevel::VeryHigh
        } else if value >= high {
            RiskLevel::High
        } else if value >= medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::VeryHigh => "VERY_HIGH",
        }
    }
}

/// Ticker context supplied by the market-data collaborator alongside a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct MarketContext {
    /// Last traded price reported by the ticker.
    pub last_price: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
}

impl MarketContext {
    /// Position of the last price within the 24h range, in `[0, 1]`.
    pub fn range_position(&self) -> Option<f64> {
        let (last, high, low) = (self.last_price?, self.high_24h?, self.low_24h?);
        if !(last.is_finite() && high.is_finite() && low.is_finite()) || high <= low {
            return None;
        }
        Some(((last - low) / (high - low)).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
        assert_eq!(Side::Buy.sign(), 1.0);
        assert_eq!(Side::Sell.sign(), -1.0);
    }

    #[test]
    fn test_direction_from_volumes() {
        assert_eq!(Direction::from_volumes(13.0, 10.0, 1.2), Direction::Bullish);
        assert_eq!(Direction::from_volumes(10.0, 13.0, 1.2), Direction::Bearish);
        assert_eq!(Direction::from_volumes(11.0, 10.0, 1.2), Direction::Neutral);
        assert_eq!(Direction::from_volumes(0.0, 0.0, 1.2), Direction::Neutral);
    }

    #[test]
    fn test_confidence_downgrade() {
        assert_eq!(Confidence::High.downgrade(), Confidence::Medium);
        assert_eq!(Confidence::Medium.downgrade(), Confidence::Low);
        assert_eq!(Confidence::Low.downgrade(), Confidence::Low);
    }

    #[test]
    fn test_risk_level_thresholds() {
        let bands = [30.0, 50.0, 75.0];
        assert_eq!(RiskLevel::from_thresholds(0.0, bands), RiskLevel::Low);
        assert_eq!(RiskLevel::from_thresholds(30.0, bands), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_thresholds(74.9, bands), RiskLevel::High);
        assert_eq!(RiskLevel::from_thresholds(100.0, bands), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_range_position() {
        let context = MarketContext {
            last_price: Some(105.0),
            high_24h: Some(110.0),
            low_24h: Some(100.0),
        };
        assert_eq!(context.range_position(), Some(0.5));

        let flat = MarketContext {
            last_price: Some(100.0),
            high_24h: Some(100.0),
            low_24h: Some(100.0),
        };
        assert_eq!(flat.range_position(), None);
        assert_eq!(MarketContext::default().range_position(), None);
    }

    #[test]
    fn test_instrument_id_serde() {
        let id = InstrumentId::new("btc_idr");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"btc_idr\"");
        assert_eq!(serde_json::from_str::<InstrumentId>(&json).unwrap(), id);
    }
}
