//! Indicator Engine
//!
//! Turns one order-book snapshot into one [`IndicatorsRecord`] and folds the
//! snapshot into the running state.
//!
//! ## Pipeline
//! validation → spread/flow → book shape → microprice/direction →
//! volatility/regime → anomalies → state update
//!
//! Every stage reads the state as it was *before* this call, so OFI, the
//! spread z-score and the shock checks measure change against the previous
//! snapshot rather than against themselves. The state is written exactly
//! once, at the end of a successful call.
//!
//! ## Degraded snapshots
//! A snapshot with an empty side, a non-positive or non-finite best price, a
//! negative best volume or a crossed/locked book yields a neutral record and
//! leaves the state untouched. The caller never sees an error.
//!
//! ## Concurrency
//! `process` takes `&mut self`; callers serialise access per stream (one
//! engine per instrument, behind a single task or a lock).

use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::pulse::anomaly::{
    SideDepth, depth_shock_anomaly, detect_liquidity_gaps, heavy_imbalance_anomaly,
    large_order_anomaly, layering_anomaly, liquidity_gap_anomaly, momentum_burst,
    momentum_ignition_anomaly, regime_anomaly, spoofing_anomaly, spread_shock_anomaly,
};
use crate::pulse::flow::{compute_obi, compute_ofi, compute_spread};
use crate::pulse::micro::{compute_microprice, directional_probability};
use crate::pulse::regime::{RegimeInputs, classify_regime};
use crate::pulse::spoofing::{detect_cancellations, spoofing_risk};
use crate::pulse::volatility::{realized_volatility, spread_z_score};
use crate::state::{EngineState, StateUpdate};
use crate::types::{IndicatorsRecord, Snapshot};
use crate::validation::{Rejection, validate_snapshot};

pub struct IndicatorEngine {
    config: EngineConfig,
    state: EngineState,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            state: EngineState::new(&config),
            config,
        }
    }
}

impl IndicatorEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: EngineState::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Drop all history and start again from the configured priors.
    pub fn reset(&mut self) {
        self.state = EngineState::new(&self.config);
    }

    /// Consume one snapshot and produce its indicators.
    pub fn process(&mut self, snapshot: &Snapshot) -> IndicatorsRecord {
        let l1 = match validate_snapshot(snapshot) {
            Ok(l1) => l1,
            Err(rejection) => {
                warn!(
                    timestamp = snapshot.timestamp,
                    reason = %rejection,
                    "degraded snapshot, emitting neutral record"
                );
                return match rejection {
                    Rejection::Crossed(l1) => IndicatorsRecord::neutral_with_l1(snapshot, l1),
                    _ => IndicatorsRecord::neutral(snapshot),
                };
            }
        };

        let cfg = &self.config;
        let state = &self.state;
        let mid = snapshot.mid_price;

        // Spread & flow
        let spread = compute_spread(&l1);
        let ofi = compute_ofi(state.prev_l1(), &l1, cfg.ofi_scale);
        let obi = compute_obi(&l1);

        // Microprice & direction
        let microprice = compute_microprice(&l1, mid);
        let divergence = microprice - mid;
        let directional_prob = directional_probability(divergence, cfg.tick_size);

        // Volatility & regime
        let spread_z = spread_z_score(spread, state.spread_moments());
        let prices = state.prices().with_candidate(mid);
        let volatility = realized_volatility(&prices);
        let regime = classify_regime(&RegimeInputs {
            ofi,
            obi,
            volatility,
            spread_z,
        });

        // Anomalies & spoofing risk
        let gaps = detect_liquidity_gaps(snapshot);
        let l1_volume = l1.avg_volume();
        let volume_baseline = state.l1_volume_baseline();
        let cancellations = detect_cancellations(
            state.prev_l1(),
            &l1,
            volume_baseline,
            cfg.spoof_price_tolerance,
        );
        let new_events = cancellations.len() as u64;
        let risk = spoofing_risk(
            &state.volumes().with_candidate(l1_volume),
            state.spoofing_events() + new_events,
            l1_volume,
            volume_baseline,
        );
        let depth = SideDepth::of(snapshot);
        let burst = momentum_burst(&prices, l1_volume, volume_baseline);
        let bursts = state.momentum_bursts() + u64::from(burst.is_some());

        let mut anomalies = Vec::new();
        anomalies.extend(liquidity_gap_anomaly(&gaps));
        anomalies.extend(heavy_imbalance_anomaly(obi));
        anomalies.extend(spread_shock_anomaly(spread, state.spread_moments().mean()));
        anomalies.extend(large_order_anomaly(l1_volume, volume_baseline));
        anomalies.extend(cancellations.iter().map(spoofing_anomaly));
        anomalies.extend(depth_shock_anomaly(state.prev_depth(), &depth));
        anomalies.extend(layering_anomaly(snapshot, volume_baseline));
        anomalies.extend(
            burst.and_then(|change| momentum_ignition_anomaly(change, l1_volume, bursts)),
        );
        anomalies.extend(regime_anomaly(regime, volatility));

        for a in &anomalies {
            debug!(
                timestamp = snapshot.timestamp,
                kind = a.kind.as_str(),
                severity = a.severity.as_str(),
                message = %a.message,
                "anomaly detected"
            );
        }
        if regime != state.last_regime() {
            debug!(
                timestamp = snapshot.timestamp,
                from = %state.last_regime(),
                to = %regime,
                "regime changed"
            );
        }
        trace!(
            timestamp = snapshot.timestamp,
            spread,
            ofi,
            ?obi,
            microprice,
            volatility,
            spread_z,
            ?risk,
            "indicators computed"
        );

        let record = IndicatorsRecord {
            timestamp: snapshot.timestamp,
            mid_price: mid,
            spread,
            ofi,
            obi,
            microprice,
            divergence,
            directional_prob,
            regime,
            regime_label: regime.label(),
            best_bid: l1.bid_px,
            best_ask: l1.ask_px,
            bid_qty: l1.bid_qty,
            ask_qty: l1.ask_qty,
            volatility,
            spread_z,
            liquidity_gap_count: gaps.count,
            liquidity_gap_severity: gaps.severity,
            spoofing_risk: risk,
            anomalies,
        };

        self.state.commit(StateUpdate {
            l1,
            spread,
            mid_price: mid,
            l1_volume,
            new_spoofing_events: new_events,
            momentum_burst: burst.is_some(),
            depth,
            regime,
        });

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnomalyKind, Level, Regime};
    use tracing_test::traced_test;

    fn snap(ts: i64, bid: (f64, f64), ask: (f64, f64)) -> Snapshot {
        Snapshot {
            timestamp: ts,
            mid_price: (bid.0 + ask.0) / 2.0,
            bids: vec![Level::new(bid.0, bid.1)],
            asks: vec![Level::new(ask.0, ask.1)],
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = EngineConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(IndicatorEngine::new(cfg).is_err());
    }

    #[test]
    fn symmetric_book_is_neutral_in_direction() {
        let mut engine = IndicatorEngine::default();
        let rec = engine.process(&snap(1, (100.0, 10.0), (100.5, 10.0)));

        assert!((rec.spread - 0.5).abs() < 1e-12);
        assert!((rec.microprice - 100.25).abs() < 1e-12);
        assert!(rec.divergence.abs() < 1e-12);
        assert!((rec.directional_prob - 50.0).abs() < 1e-9);
        assert_eq!(rec.ofi, 0.0);
        assert_eq!(rec.obi, Some(0.0));
        assert_eq!(engine.state().processed(), 1);
    }

    #[test]
    fn state_reflects_pre_update_values() {
        let mut engine = IndicatorEngine::default();
        engine.process(&snap(1, (100.0, 100.0), (100.5, 100.0)));
        let rec = engine.process(&snap(2, (100.0, 400.0), (100.5, 0.0)));

        // (300 - (-100)) / 1000, measured against the first snapshot
        assert!((rec.ofi - 0.4).abs() < 1e-12);
        assert_eq!(engine.state().prev_l1().unwrap().bid_qty, 400.0);
    }

    #[test]
    fn spread_shock_uses_baseline_before_update() {
        let mut engine = IndicatorEngine::default();
        // 0.16 > 3 * 0.05 prior
        let rec = engine.process(&snap(1, (100.0, 100.0), (100.16, 100.0)));
        assert!(rec.has_anomaly(AnomalyKind::SpreadShock));
    }

    #[test]
    fn reset_restores_priors() {
        let mut engine = IndicatorEngine::default();
        engine.process(&snap(1, (100.0, 100.0), (100.5, 100.0)));
        engine.reset();
        assert!(engine.state().prev_l1().is_none());
        assert_eq!(engine.state().spread_moments().mean(), 0.05);
        assert_eq!(engine.state().last_regime(), Regime::Calm);
    }

    #[test]
    #[traced_test]
    fn degraded_snapshot_is_logged_with_reason() {
        let mut engine = IndicatorEngine::default();
        let rec = engine.process(&snap(1, (101.0, 10.0), (100.0, 10.0)));

        assert_eq!(rec.spread, 0.0);
        assert_eq!(rec.best_bid, 101.0);
        assert!(logs_contain("degraded snapshot"));
        assert!(logs_contain("crossed or locked book"));
    }
}
