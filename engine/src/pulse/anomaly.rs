//! Anomaly rules.
//!
//! Each rule returns at most one [`Anomaly`]; the engine calls them in a
//! fixed order and keeps every match, so the record's anomaly list is in
//! detection order.

use super::EPSILON;
use super::spoofing::{BookSide, Cancellation, LARGE_L1_MULTIPLE};
use crate::types::{Anomaly, AnomalyKind, Level, Regime, Severity, Snapshot};

/// Levels inspected for liquidity gaps.
pub const GAP_LOOKBACK: usize = 10;
/// Resting volume below this counts as a gap.
pub const GAP_VOLUME: f64 = 50.0;
/// More gaps than this raise an anomaly.
pub const GAP_ALERT_COUNT: u32 = 3;
/// More gaps than this escalate it to critical.
pub const GAP_CRITICAL_COUNT: u32 = 6;

pub const HEAVY_IMBALANCE: f64 = 0.5;
pub const SPREAD_SHOCK_MULTIPLE: f64 = 3.0;
/// Fractional drop of total side depth that counts as a shock.
pub const DEPTH_SHOCK_DROP: f64 = 0.3;

/// Levels per side inspected for layering.
pub const LAYERING_LOOKBACK: usize = 5;
/// A level above this multiple of the L1 volume baseline is a large order.
pub const LAYERING_LEVEL_MULTIPLE: f64 = 2.0;
pub const LAYERING_MIN_LEVELS: usize = 3;
/// The layered side must beat the other side's count by more than this.
pub const LAYERING_MARGIN: usize = 2;
const LAYERING_SCORE_PER_LEVEL: u32 = 20;
const LAYERING_MAX_SCORE: u32 = 100;
const LAYERING_ALERT_SCORE: u32 = 50;
const LAYERING_CRITICAL_SCORE: u32 = 70;

/// Relative one-tick mid move that counts as aggressive.
pub const IGNITION_MOVE: f64 = 0.002;
pub const IGNITION_VOLUME_MULTIPLE: f64 = 2.5;
/// Consecutive same-direction moves required, the current one included.
pub const IGNITION_RUN: usize = 3;
/// Bursts required, the current one included, before ignition is reported.
pub const IGNITION_MIN_BURSTS: u64 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiquidityGaps {
    pub count: u32,
    /// Sum of `(GAP_LOOKBACK - level) * 2` over gaps, so gaps near the
    /// touch weigh more.
    pub severity: u32,
}

/// Count thin levels over the first paired levels of the book. Each side is
/// counted on its own, so one level contributes up to two gaps.
pub fn detect_liquidity_gaps(snapshot: &Snapshot) -> LiquidityGaps {
    let depth = snapshot.paired_depth(GAP_LOOKBACK);
    let mut gaps = LiquidityGaps::default();

    for (level, (bid, ask)) in snapshot
        .bids
        .iter()
        .zip(snapshot.asks.iter())
        .take(depth)
        .enumerate()
    {
        let weight = (GAP_LOOKBACK - level) as u32 * 2;
        for volume in [bid.volume, ask.volume] {
            if volume < GAP_VOLUME {
                gaps.count += 1;
                gaps.severity += weight;
            }
        }
    }

    gaps
}

pub fn liquidity_gap_anomaly(gaps: &LiquidityGaps) -> Option<Anomaly> {
    if gaps.count <= GAP_ALERT_COUNT {
        return None;
    }
    let severity = if gaps.count > GAP_CRITICAL_COUNT {
        Severity::Critical
    } else {
        Severity::High
    };
    Some(Anomaly::new(
        AnomalyKind::LiquidityGap,
        severity,
        format!("Liquidity gaps detected at {} levels", gaps.count),
    ))
}

pub fn heavy_imbalance_anomaly(obi: Option<f64>) -> Option<Anomaly> {
    let obi = obi?;
    if obi.abs() <= HEAVY_IMBALANCE {
        return None;
    }
    let message = if obi > 0.0 {
        "Heavy BUY pressure"
    } else {
        "Heavy SELL pressure"
    };
    Some(Anomaly::new(
        AnomalyKind::HeavyImbalance,
        Severity::High,
        message,
    ))
}

/// `baseline` is the EWMA spread before this snapshot is folded in.
pub fn spread_shock_anomaly(spread: f64, baseline: f64) -> Option<Anomaly> {
    if spread <= 0.0 || spread <= SPREAD_SHOCK_MULTIPLE * baseline {
        return None;
    }
    Some(Anomaly::new(
        AnomalyKind::SpreadShock,
        Severity::Medium,
        format!("Wide spread detected: {spread:.4}"),
    ))
}

pub fn large_order_anomaly(l1_volume: f64, baseline: f64) -> Option<Anomaly> {
    if l1_volume <= LARGE_L1_MULTIPLE * baseline {
        return None;
    }
    Some(Anomaly::new(
        AnomalyKind::LargeOrder,
        Severity::Medium,
        "Unusually large L1 volume detected",
    ))
}

pub fn spoofing_anomaly(cancel: &Cancellation) -> Anomaly {
    Anomaly::new(
        AnomalyKind::Spoofing,
        Severity::Critical,
        format!(
            "Potential spoofing: large {} order cancelled (volume dropped {:.1}x)",
            cancel.side,
            cancel.volume_ratio()
        ),
    )
}

/// Total resting depth per side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SideDepth {
    pub bid: f64,
    pub ask: f64,
}

impl SideDepth {
    pub fn of(snapshot: &Snapshot) -> Self {
        Self {
            bid: snapshot.total_bid_depth(),
            ask: snapshot.total_ask_depth(),
        }
    }
}

fn drop_fraction(prev: f64, curr: f64) -> f64 {
    if prev > EPSILON {
        (prev - curr) / prev
    } else {
        0.0
    }
}

/// Flags a sudden withdrawal of depth on either side.
pub fn depth_shock_anomaly(prev: &SideDepth, current: &SideDepth) -> Option<Anomaly> {
    if prev.bid <= EPSILON {
        return None;
    }
    let bid_drop = drop_fraction(prev.bid, current.bid);
    let ask_drop = drop_fraction(prev.ask, current.ask);

    if bid_drop <= DEPTH_SHOCK_DROP && ask_drop <= DEPTH_SHOCK_DROP {
        return None;
    }
    Some(Anomaly::new(
        AnomalyKind::DepthShock,
        Severity::High,
        format!(
            "Depth shock (bid -{:.0}%, ask -{:.0}%)",
            bid_drop.max(0.0) * 100.0,
            ask_drop.max(0.0) * 100.0
        ),
    ))
}

fn large_levels(levels: &[Level], baseline: f64) -> usize {
    levels
        .iter()
        .take(LAYERING_LOOKBACK)
        .filter(|l| l.volume > LAYERING_LEVEL_MULTIPLE * baseline)
        .count()
}

/// Several large orders stacked across the top levels of one side only.
///
/// `baseline` is the L1 volume EWMA before this snapshot.
pub fn layering_anomaly(snapshot: &Snapshot, baseline: f64) -> Option<Anomaly> {
    let bid = large_levels(&snapshot.bids, baseline);
    let ask = large_levels(&snapshot.asks, baseline);

    let (side, count) = if bid >= LAYERING_MIN_LEVELS && bid > ask + LAYERING_MARGIN {
        (BookSide::Bid, bid)
    } else if ask >= LAYERING_MIN_LEVELS && ask > bid + LAYERING_MARGIN {
        (BookSide::Ask, ask)
    } else {
        return None;
    };

    let score = (count as u32 * LAYERING_SCORE_PER_LEVEL).min(LAYERING_MAX_SCORE);
    if score <= LAYERING_ALERT_SCORE {
        return None;
    }
    let severity = if score > LAYERING_CRITICAL_SCORE {
        Severity::Critical
    } else {
        Severity::High
    };
    Some(Anomaly::new(
        AnomalyKind::Layering,
        severity,
        format!("Layering: {count} large orders on {side} side"),
    ))
}

/// Relative mid change of the current snapshot when it is an aggressive
/// burst: a large one-tick move on heavy L1 volume that extends a run of
/// [`IGNITION_RUN`] moves in one direction.
///
/// `prices` is the mid history with the current mid last.
pub fn momentum_burst(prices: &[f64], l1_volume: f64, baseline: f64) -> Option<f64> {
    if prices.len() < IGNITION_RUN + 1 || l1_volume <= IGNITION_VOLUME_MULTIPLE * baseline {
        return None;
    }

    let tail = &prices[prices.len() - (IGNITION_RUN + 1)..];
    if tail.iter().any(|p| *p <= 0.0) {
        return None;
    }
    let moves: Vec<f64> = tail.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();

    let change = *moves.last()?;
    if change.abs() <= IGNITION_MOVE {
        return None;
    }
    let same_direction = moves.iter().all(|m| *m > 0.0) || moves.iter().all(|m| *m < 0.0);
    same_direction.then_some(change)
}

/// `bursts` counts every burst seen so far, the current one included.
pub fn momentum_ignition_anomaly(change: f64, l1_volume: f64, bursts: u64) -> Option<Anomaly> {
    if bursts < IGNITION_MIN_BURSTS {
        return None;
    }
    Some(Anomaly::new(
        AnomalyKind::MomentumIgnition,
        Severity::Critical,
        format!(
            "Momentum ignition: rapid {:+.2}% move with {l1_volume:.0} volume",
            change * 100.0
        ),
    ))
}

pub fn regime_anomaly(regime: Regime, volatility: f64) -> Option<Anomaly> {
    match regime {
        Regime::Stressed => Some(Anomaly::new(
            AnomalyKind::RegimeStress,
            Severity::Medium,
            format!("Market regime: Stressed (volatility {volatility:.4})"),
        )),
        Regime::ManipulationSuspected => Some(Anomaly::new(
            AnomalyKind::RegimeCrisis,
            Severity::Critical,
            "Market regime: Manipulation Suspected",
        )),
        Regime::Calm | Regime::ExecutionHot => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(volumes: &[(f64, f64)]) -> Snapshot {
        Snapshot {
            timestamp: 0,
            mid_price: 100.0,
            bids: volumes
                .iter()
                .enumerate()
                .map(|(i, (b, _))| Level::new(99.9 - i as f64 * 0.1, *b))
                .collect(),
            asks: volumes
                .iter()
                .enumerate()
                .map(|(i, (_, a))| Level::new(100.1 + i as f64 * 0.1, *a))
                .collect(),
        }
    }

    #[test]
    fn counts_each_side_and_weights_near_levels() {
        let snap = book(&[(10.0, 10.0), (100.0, 20.0), (100.0, 100.0)]);
        let gaps = detect_liquidity_gaps(&snap);
        assert_eq!(gaps.count, 3);
        // level 0 twice (20 each) + level 1 once (18)
        assert_eq!(gaps.severity, 58);
    }

    #[test]
    fn only_paired_levels_are_inspected() {
        let mut snap = book(&[(100.0, 100.0)]);
        snap.bids.push(Level::new(99.0, 1.0));
        snap.bids.push(Level::new(98.0, 1.0));
        assert_eq!(detect_liquidity_gaps(&snap).count, 0);
    }

    #[test]
    fn lookback_is_capped_at_ten_levels() {
        let snap = book(&[(1.0, 1.0); 15]);
        let gaps = detect_liquidity_gaps(&snap);
        assert_eq!(gaps.count, 20);
    }

    #[test]
    fn gap_anomaly_escalates_with_count() {
        let few = LiquidityGaps {
            count: 3,
            severity: 0,
        };
        assert!(liquidity_gap_anomaly(&few).is_none());

        let some = LiquidityGaps {
            count: 5,
            severity: 0,
        };
        let a = liquidity_gap_anomaly(&some).unwrap();
        assert_eq!(a.severity, Severity::High);
        assert!(a.message.contains('5'));

        let many = LiquidityGaps {
            count: 7,
            severity: 0,
        };
        assert_eq!(
            liquidity_gap_anomaly(&many).unwrap().severity,
            Severity::Critical
        );
    }

    #[test]
    fn imbalance_direction_in_message() {
        assert_eq!(
            heavy_imbalance_anomaly(Some(0.6)).unwrap().message,
            "Heavy BUY pressure"
        );
        assert_eq!(
            heavy_imbalance_anomaly(Some(-0.6)).unwrap().message,
            "Heavy SELL pressure"
        );
        assert!(heavy_imbalance_anomaly(Some(0.5)).is_none());
        assert!(heavy_imbalance_anomaly(None).is_none());
    }

    #[test]
    fn spread_shock_requires_positive_wide_spread() {
        assert!(spread_shock_anomaly(0.0, 0.0).is_none());
        assert!(spread_shock_anomaly(0.15, 0.05).is_none());
        let a = spread_shock_anomaly(0.2, 0.05).unwrap();
        assert_eq!(a.kind, AnomalyKind::SpreadShock);
        assert!(a.message.contains("0.2000"));
    }

    #[test]
    fn large_order_threshold() {
        assert!(large_order_anomaly(40.0, 10.0).is_none());
        assert!(large_order_anomaly(40.1, 10.0).is_some());
    }

    #[test]
    fn spoofing_message_names_side_and_ratio() {
        let a = spoofing_anomaly(&Cancellation {
            side: BookSide::Ask,
            prev_qty: 60.0,
            curr_qty: 2.0,
        });
        assert_eq!(a.severity, Severity::Critical);
        assert!(a.message.contains("ASK"));
        assert!(a.message.contains("30.0x"));
    }

    #[test]
    fn depth_shock_on_either_side() {
        let prev = SideDepth {
            bid: 1000.0,
            ask: 1000.0,
        };
        let calm = SideDepth {
            bid: 800.0,
            ask: 900.0,
        };
        assert!(depth_shock_anomaly(&prev, &calm).is_none());

        let pulled = SideDepth {
            bid: 1000.0,
            ask: 500.0,
        };
        let a = depth_shock_anomaly(&prev, &pulled).unwrap();
        assert!(a.message.contains("ask -50%"));
        assert!(a.message.contains("bid -0%"));
    }

    #[test]
    fn no_depth_shock_without_history() {
        let now = SideDepth { bid: 1.0, ask: 1.0 };
        assert!(depth_shock_anomaly(&SideDepth::default(), &now).is_none());
    }

    fn ladder(bid_volumes: &[f64], ask_volumes: &[f64]) -> Snapshot {
        Snapshot {
            timestamp: 0,
            mid_price: 100.0,
            bids: bid_volumes
                .iter()
                .enumerate()
                .map(|(i, v)| Level::new(99.9 - i as f64 * 0.1, *v))
                .collect(),
            asks: ask_volumes
                .iter()
                .enumerate()
                .map(|(i, v)| Level::new(100.1 + i as f64 * 0.1, *v))
                .collect(),
        }
    }

    #[test]
    fn three_stacked_bids_are_high_layering() {
        let snap = ladder(&[30.0, 30.0, 30.0, 5.0, 5.0], &[5.0; 5]);
        let a = layering_anomaly(&snap, 10.0).unwrap();
        assert_eq!(a.kind, AnomalyKind::Layering);
        assert_eq!(a.severity, Severity::High);
        assert_eq!(a.message, "Layering: 3 large orders on BID side");
    }

    #[test]
    fn four_stacked_asks_are_critical_layering() {
        let snap = ladder(&[5.0; 5], &[30.0, 30.0, 30.0, 30.0, 5.0]);
        let a = layering_anomaly(&snap, 10.0).unwrap();
        assert_eq!(a.severity, Severity::Critical);
        assert!(a.message.contains("ASK"));
    }

    #[test]
    fn layering_needs_one_sided_stack_within_top_levels() {
        // 3 vs 1 is not more than the margin
        let balanced = ladder(&[30.0, 30.0, 30.0, 5.0, 5.0], &[30.0, 5.0, 5.0, 5.0, 5.0]);
        assert!(layering_anomaly(&balanced, 10.0).is_none());

        // large levels beyond the fifth do not count
        let deep = ladder(&[5.0, 5.0, 5.0, 5.0, 5.0, 30.0, 30.0, 30.0], &[5.0; 8]);
        assert!(layering_anomaly(&deep, 10.0).is_none());
    }

    #[test]
    fn burst_needs_run_move_and_volume() {
        let up = [100.0, 100.5, 101.0, 101.5];
        let change = momentum_burst(&up, 30.0, 10.0).unwrap();
        assert!((change - 0.5 / 101.0).abs() < 1e-12);

        let down = [101.5, 101.0, 100.5, 100.0];
        assert!(momentum_burst(&down, 30.0, 10.0).unwrap() < 0.0);

        // volume not above 2.5x baseline
        assert!(momentum_burst(&up, 25.0, 10.0).is_none());
        // broken run
        assert!(momentum_burst(&[100.0, 99.0, 101.0, 101.5], 30.0, 10.0).is_none());
        // last move too small
        assert!(momentum_burst(&[100.0, 100.5, 101.0, 101.1], 30.0, 10.0).is_none());
        // not enough history
        assert!(momentum_burst(&up[1..], 30.0, 10.0).is_none());
    }

    #[test]
    fn ignition_reported_from_second_burst() {
        assert!(momentum_ignition_anomaly(0.01, 100.0, 1).is_none());
        let a = momentum_ignition_anomaly(0.0098, 100.0, 2).unwrap();
        assert_eq!(a.severity, Severity::Critical);
        assert_eq!(a.message, "Momentum ignition: rapid +0.98% move with 100 volume");

        let a = momentum_ignition_anomaly(-0.005, 40.0, 3).unwrap();
        assert!(a.message.contains("-0.50%"));
    }

    #[test]
    fn regime_anomalies_for_stress_and_crisis() {
        let a = regime_anomaly(Regime::Stressed, 1.23456).unwrap();
        assert_eq!(a.kind, AnomalyKind::RegimeStress);
        assert_eq!(a.severity, Severity::Medium);
        assert!(a.message.contains("1.2346"));

        let a = regime_anomaly(Regime::ManipulationSuspected, 9.0).unwrap();
        assert_eq!(a.kind, AnomalyKind::RegimeCrisis);
        assert_eq!(a.severity, Severity::Critical);

        assert!(regime_anomaly(Regime::Calm, 0.0).is_none());
        assert!(regime_anomaly(Regime::ExecutionHot, 6.0).is_none());
    }
}
