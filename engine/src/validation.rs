use thiserror::Error;

use crate::types::{L1, Snapshot};

/// Why a snapshot cannot go through the full pipeline.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    #[error("bid or ask side is empty")]
    EmptySide,

    #[error("non-finite price, volume or mid price")]
    NonFinite,

    #[error("best price is not positive (bid {bid}, ask {ask})")]
    NonPositivePrice { bid: f64, ask: f64 },

    #[error("best volume is negative (bid {bid}, ask {ask})")]
    NegativeVolume { bid: f64, ask: f64 },

    /// Ask at or below bid. The observed top of book is kept for the record.
    #[error("crossed or locked book (bid {}, ask {})", .0.bid_px, .0.ask_px)]
    Crossed(L1),
}

/// Extract a usable top of book or say why there is none.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<L1, Rejection> {
    let (Some(bid), Some(ask)) = (snapshot.best_bid(), snapshot.best_ask()) else {
        return Err(Rejection::EmptySide);
    };

    let l1 = L1 {
        bid_px: bid.price,
        bid_qty: bid.volume,
        ask_px: ask.price,
        ask_qty: ask.volume,
    };

    let finite = [l1.bid_px, l1.bid_qty, l1.ask_px, l1.ask_qty, snapshot.mid_price]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(Rejection::NonFinite);
    }

    if l1.bid_px <= 0.0 || l1.ask_px <= 0.0 {
        return Err(Rejection::NonPositivePrice {
            bid: l1.bid_px,
            ask: l1.ask_px,
        });
    }

    if l1.bid_qty < 0.0 || l1.ask_qty < 0.0 {
        return Err(Rejection::NegativeVolume {
            bid: l1.bid_qty,
            ask: l1.ask_qty,
        });
    }

    if l1.ask_px <= l1.bid_px {
        return Err(Rejection::Crossed(l1));
    }

    Ok(l1)
}
