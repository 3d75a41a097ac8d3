//! Spoofing-risk score and detection of cancelled large L1 orders.

use std::fmt;

use super::{EPSILON, safe_div};
use crate::rolling_window::{mean, std_dev};
use crate::types::L1;

/// Volume samples required before the risk score is reported.
pub const MIN_RISK_SAMPLES: usize = 5;

/// L1 volume above this multiple of the baseline is a large order.
pub const LARGE_L1_MULTIPLE: f64 = 4.0;
/// L1 volume above this multiple of the baseline is elevated.
pub const ELEVATED_L1_MULTIPLE: f64 = 2.0;

const BASE_RISK_WEIGHT: f64 = 50.0;
const BASE_RISK_CAP: f64 = 30.0;
const EVENT_RISK_WEIGHT: f64 = 5.0;
const EVENT_RISK_CAP: f64 = 40.0;
const LARGE_SIZE_RISK: f64 = 30.0;
const ELEVATED_SIZE_RISK: f64 = 15.0;
const MAX_RISK: f64 = 100.0;

/// A previous L1 quantity above this multiple of the baseline counts as large.
pub const CANCEL_PREV_MULTIPLE: f64 = 3.0;
/// A current L1 quantity below this multiple of the baseline counts as pulled.
pub const CANCEL_CURR_MULTIPLE: f64 = 0.3;

pub fn size_risk(l1_volume: f64, baseline: f64) -> f64 {
    if l1_volume > LARGE_L1_MULTIPLE * baseline {
        LARGE_SIZE_RISK
    } else if l1_volume > ELEVATED_L1_MULTIPLE * baseline {
        ELEVATED_SIZE_RISK
    } else {
        0.0
    }
}

/// Heuristic 0-100 score for deceptive resting size.
///
/// `volumes` is the recent L1 average-volume history including the current
/// snapshot. `None` until [`MIN_RISK_SAMPLES`] samples exist.
pub fn spoofing_risk(volumes: &[f64], events: u64, l1_volume: f64, baseline: f64) -> Option<f64> {
    if volumes.len() < MIN_RISK_SAMPLES {
        return None;
    }

    let m = mean(volumes)?;
    let s = std_dev(volumes)?;
    let volume_volatility = safe_div(s, m.max(EPSILON), 0.0);

    let base = (volume_volatility * BASE_RISK_WEIGHT).min(BASE_RISK_CAP);
    let event = (events as f64 * EVENT_RISK_WEIGHT).min(EVENT_RISK_CAP);
    let size = size_risk(l1_volume, baseline);

    Some((base + event + size).clamp(0.0, MAX_RISK))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSide::Bid => "BID",
            BookSide::Ask => "ASK",
        }
    }
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A large L1 order that vanished while the price stayed put.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cancellation {
    pub side: BookSide,
    pub prev_qty: f64,
    pub curr_qty: f64,
}

impl Cancellation {
    /// How many times larger the pulled order was than what remains.
    pub fn volume_ratio(&self) -> f64 {
        self.prev_qty / self.curr_qty.max(1.0)
    }
}

/// Compare two consecutive tops of book for pulled large orders, bid first.
pub fn detect_cancellations(
    prev: Option<&L1>,
    current: &L1,
    baseline: f64,
    price_tolerance: f64,
) -> Vec<Cancellation> {
    let Some(prev) = prev else {
        return Vec::new();
    };

    let sides = [
        (BookSide::Bid, prev.bid_px, prev.bid_qty, current.bid_px, current.bid_qty),
        (BookSide::Ask, prev.ask_px, prev.ask_qty, current.ask_px, current.ask_qty),
    ];

    sides
        .into_iter()
        .filter(|&(_, prev_px, prev_qty, curr_px, curr_qty)| {
            prev_qty > CANCEL_PREV_MULTIPLE * baseline
                && curr_qty < CANCEL_CURR_MULTIPLE * baseline
                && (curr_px - prev_px).abs() < price_tolerance
        })
        .map(|(side, _, prev_qty, _, curr_qty)| Cancellation {
            side,
            prev_qty,
            curr_qty,
        })
        .collect()
}
