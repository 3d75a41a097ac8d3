//! Microprice and the directional score derived from its divergence.

use super::{EPSILON, safe_div};
use crate::types::L1;

/// Quantity-weighted fair value, each price weighted by the opposite side's
/// quantity. Falls back to `mid` when the book holds no L1 quantity.
pub fn compute_microprice(l1: &L1, mid: f64) -> f64 {
    let num = l1.bid_qty * l1.ask_px + l1.ask_qty * l1.bid_px;
    safe_div(num, l1.total_qty(), mid)
}

/// Probability, in percent, that the next move is up.
///
/// ```text
/// p = 100 / (1 + exp(-2 * divergence / tick))
/// ```
pub fn directional_probability(divergence: f64, tick_size: f64) -> f64 {
    let score = divergence / tick_size.max(EPSILON);
    let p = 100.0 / (1.0 + (-2.0 * score).exp());
    if p.is_nan() { 50.0 } else { p.clamp(0.0, 100.0) }
}
