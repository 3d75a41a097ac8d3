//! Spread, order-flow imbalance and order-book imbalance.

use super::{EPSILON, safe_div};
use crate::types::L1;

/// OFI is clamped to `[-OFI_LIMIT, OFI_LIMIT]`.
pub const OFI_LIMIT: f64 = 1.0;

/// Best ask minus best bid.
pub fn compute_spread(l1: &L1) -> f64 {
    l1.ask_px - l1.bid_px
}

/// Order-flow imbalance relative to the previous top of book.
///
/// ```text
/// ofi = clamp((Δbid_qty - Δask_qty) / scale, -1, 1)
/// ```
///
/// With no previous L1 recorded the flow is unknown and OFI is 0.
pub fn compute_ofi(prev: Option<&L1>, current: &L1, scale: f64) -> f64 {
    let Some(prev) = prev else {
        return 0.0;
    };

    let d_bid = current.bid_qty - prev.bid_qty;
    let d_ask = current.ask_qty - prev.ask_qty;

    safe_div(d_bid - d_ask, scale, 0.0).clamp(-OFI_LIMIT, OFI_LIMIT)
}

/// Order-book imbalance at L1, `None` when both sides are empty.
pub fn compute_obi(l1: &L1) -> Option<f64> {
    let total = l1.total_qty();
    if total <= EPSILON {
        return None;
    }
    Some(((l1.bid_qty - l1.ask_qty) / total).clamp(-1.0, 1.0))
}
