//! Market regime classification.
//!
//! Rules are evaluated top-down and the first match wins, so the more
//! severe, more specific regimes sit first even when a later, coarser rule
//! would also match. Manipulation requires all three signals at once; hot
//! execution needs only one.

use crate::types::Regime;

pub const MANIPULATION_OFI: f64 = 0.7;
pub const MANIPULATION_VOLATILITY: f64 = 5.0;
pub const MANIPULATION_SPREAD_Z: f64 = 2.0;

pub const HOT_VOLATILITY: f64 = 4.0;
pub const HOT_OFI: f64 = 0.6;

pub const STRESS_THRESHOLD: f64 = 3.0;

/// Signals the classifier reads. Absent OBI contributes nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RegimeInputs {
    pub ofi: f64,
    pub obi: Option<f64>,
    pub volatility: f64,
    pub spread_z: f64,
}

impl RegimeInputs {
    /// |spreadZ| + 2·|OBI| + vol/10 + 3·|OFI|
    pub fn stress_score(&self) -> f64 {
        self.spread_z.abs()
            + 2.0 * self.obi.unwrap_or(0.0).abs()
            + self.volatility / 10.0
            + 3.0 * self.ofi.abs()
    }
}

type Rule = (fn(&RegimeInputs) -> bool, Regime);

const RULES: &[Rule] = &[
    (is_manipulation, Regime::ManipulationSuspected),
    (is_execution_hot, Regime::ExecutionHot),
    (is_stressed, Regime::Stressed),
];

fn is_manipulation(i: &RegimeInputs) -> bool {
    i.ofi.abs() > MANIPULATION_OFI
        && i.volatility > MANIPULATION_VOLATILITY
        && i.spread_z > MANIPULATION_SPREAD_Z
}

fn is_execution_hot(i: &RegimeInputs) -> bool {
    i.volatility > HOT_VOLATILITY || i.ofi.abs() > HOT_OFI
}

fn is_stressed(i: &RegimeInputs) -> bool {
    i.stress_score() > STRESS_THRESHOLD
}

pub fn classify_regime(inputs: &RegimeInputs) -> Regime {
    RULES
        .iter()
        .find(|(matches, _)| matches(inputs))
        .map(|(_, regime)| *regime)
        .unwrap_or(Regime::Calm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_market_is_calm() {
        assert_eq!(classify_regime(&RegimeInputs::default()), Regime::Calm);
    }

    #[test]
    fn all_three_extremes_flag_manipulation() {
        let i = RegimeInputs {
            ofi: -0.8,
            obi: Some(0.0),
            volatility: 6.0,
            spread_z: 2.5,
        };
        assert_eq!(classify_regime(&i), Regime::ManipulationSuspected);
    }

    #[test]
    fn negative_spread_z_is_not_manipulation() {
        let i = RegimeInputs {
            ofi: 0.8,
            obi: None,
            volatility: 6.0,
            spread_z: -2.5,
        };
        assert_eq!(classify_regime(&i), Regime::ExecutionHot);
    }

    #[test]
    fn one_hot_signal_is_enough_for_execution_hot() {
        let by_vol = RegimeInputs {
            volatility: 4.5,
            ..Default::default()
        };
        let by_ofi = RegimeInputs {
            ofi: -0.65,
            ..Default::default()
        };
        assert_eq!(classify_regime(&by_vol), Regime::ExecutionHot);
        assert_eq!(classify_regime(&by_ofi), Regime::ExecutionHot);
    }

    #[test]
    fn stress_only_inputs_stay_stressed() {
        // 1.0 + 2*0.9 + 3.0/10 + 0 = 3.1, below every hotter threshold
        let i = RegimeInputs {
            ofi: 0.0,
            obi: Some(0.9),
            volatility: 3.0,
            spread_z: 1.0,
        };
        assert!(i.stress_score() > STRESS_THRESHOLD);
        assert_eq!(classify_regime(&i), Regime::Stressed);
    }

    #[test]
    fn absent_obi_contributes_nothing() {
        let i = RegimeInputs {
            ofi: 0.0,
            obi: None,
            volatility: 3.0,
            spread_z: 2.0,
        };
        assert!((i.stress_score() - 2.3).abs() < 1e-12);
        assert_eq!(classify_regime(&i), Regime::Calm);
    }
}
