//! Spread z-score and realized mid-price volatility.

use crate::ewma::EwmaMoments;
use crate::rolling_window::std_dev;

/// Floor on the running spread std used by the z-score.
pub const MIN_SPREAD_STD: f64 = 1e-6;

/// Mid prices required before volatility is reported.
pub const MIN_VOLATILITY_SAMPLES: usize = 10;

/// Scales the std of log-returns into a human-comparable range.
pub const VOLATILITY_SCALE: f64 = 1000.0;

/// Spread z-score against the running EWMA moments.
pub fn spread_z_score(spread: f64, moments: &EwmaMoments) -> f64 {
    (spread - moments.mean()) / moments.std_dev().max(MIN_SPREAD_STD)
}

/// Population std of log-returns between consecutive prices, times
/// [`VOLATILITY_SCALE`].
///
/// Returns 0 until [`MIN_VOLATILITY_SAMPLES`] prices are available. Pairs
/// involving a non-positive price are skipped.
pub fn realized_volatility(prices: &[f64]) -> f64 {
    if prices.len() < MIN_VOLATILITY_SAMPLES {
        return 0.0;
    }

    let returns: Vec<f64> = prices
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    std_dev(&returns)
        .map(|s| s * VOLATILITY_SCALE)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_score_uses_std_floor() {
        let m = EwmaMoments::new(0.05, 0.0025, 0.05);
        let z = spread_z_score(0.050001, &m);
        assert!((z - 1.0).abs() < 1e-3);
    }

    #[test]
    fn z_score_with_dispersion() {
        // mean 1, E[x²] 2 => std 1
        let m = EwmaMoments::new(1.0, 2.0, 0.05);
        assert!((spread_z_score(3.0, &m) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn volatility_needs_enough_history() {
        let prices = [100.0, 101.0, 99.0, 102.0];
        assert_eq!(realized_volatility(&prices), 0.0);
    }

    #[test]
    fn flat_prices_have_zero_volatility() {
        let prices = [100.0; 12];
        assert_eq!(realized_volatility(&prices), 0.0);
    }

    #[test]
    fn alternating_prices_have_positive_volatility() {
        let prices: Vec<f64> = (0..12)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let v = realized_volatility(&prices);
        // returns alternate ±ln(1.01), population std a little under 0.00995
        assert!(v > 9.8 && v < 10.0);
    }

    #[test]
    fn non_positive_prices_are_skipped() {
        let mut prices = vec![100.0; 12];
        prices[5] = 0.0;
        let v = realized_volatility(&prices);
        assert!(v.is_finite());
        assert_eq!(v, 0.0);
    }
}
