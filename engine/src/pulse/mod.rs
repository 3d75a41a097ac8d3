//! Indicator stages.
//!
//! Every stage is a pure function of the current snapshot and a read-only
//! view of the engine state taken *before* this call's update. None of them
//! mutate anything; [`crate::engine::IndicatorEngine`] owns the single state
//! update at the end of a call.

pub mod anomaly;
pub mod flow;
pub mod micro;
pub mod regime;
pub mod spoofing;
pub mod volatility;

/// Floor applied to every denominator.
pub const EPSILON: f64 = 1e-9;

/// Divide, falling back to `fallback` when the denominator is within
/// [`EPSILON`] of zero or the result is not finite.
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() <= EPSILON {
        return fallback;
    }
    let out = num / den;
    if out.is_finite() { out } else { fallback }
}
