use crate::model::{BookSide, OrderBookSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImbalanceSignal {
    StrongBidSide,
    BidSide,
    #[default]
    Balanced,
    AskSide,
    StrongAskSide,
}

impl ImbalanceSignal {
    pub fn from_obi(obi: f64) -> Self {
        if obi >= 0.3 {
            ImbalanceSignal::StrongBidSide
        } else if obi >= 0.2 {
            ImbalanceSignal::BidSide
        } else if obi <= -0.3 {
            ImbalanceSignal::StrongAskSide
        } else if obi <= -0.2 {
            ImbalanceSignal::AskSide
        } else {
            ImbalanceSignal::Balanced
        }
    }
}

/// Multi-level order book imbalance. Signal is classified on `obi_5`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderBookImbalance {
    pub obi_5: f64,
    pub obi_10: f64,
    pub obi_20: f64,
    pub signal: ImbalanceSignal,
}

impl OrderBookImbalance {
    pub fn compute(book: &OrderBookSnapshot) -> Self {
        let obi_5 = obi(book, 5);

        Self {
            obi_5,
            obi_10: obi(book, 10),
            obi_20: obi(book, 20),
            signal: ImbalanceSignal::from_obi(obi_5),
        }
    }
}

/// `(bid - ask) / (bid + ask)` over the top `levels` levels, 0 when both sides are empty.
pub fn obi(book: &OrderBookSnapshot, levels: usize) -> f64 {
    let bid = book.depth_top(BookSide::Bid, levels);
    let ask = book.depth_top(BookSide::Ask, levels);
    let total = bid + ask;

    if total > 0.0 {
        ((bid - ask) / total).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
