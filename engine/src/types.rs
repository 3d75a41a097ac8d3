use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Wire value written in place of an undefined order-book imbalance.
pub const OBI_UNDEFINED: f64 = 20.0;

/// One price level: resting volume at a price.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub volume: f64,
}

impl Level {
    pub fn new(price: f64, volume: f64) -> Self {
        Self { price, volume }
    }
}

/// Order-book snapshot for one stream.
///
/// Bids are ordered by descending price and asks by ascending price, best
/// level first. Either side may be empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: i64,
    pub mid_price: f64,
    #[serde(default)]
    pub bids: Vec<Level>,
    #[serde(default)]
    pub asks: Vec<Level>,
}

impl Snapshot {
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    /// Number of bid/ask pairs available at the top of the book, capped at `max`.
    pub fn paired_depth(&self, max: usize) -> usize {
        self.bids.len().min(self.asks.len()).min(max)
    }

    pub fn total_bid_depth(&self) -> f64 {
        self.bids.iter().map(|l| l.volume).sum()
    }

    pub fn total_ask_depth(&self) -> f64 {
        self.asks.iter().map(|l| l.volume).sum()
    }
}

/// Top of book.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct L1 {
    pub bid_px: f64,
    pub bid_qty: f64,
    pub ask_px: f64,
    pub ask_qty: f64,
}

impl L1 {
    /// Average of best bid and best ask quantity.
    pub fn avg_volume(&self) -> f64 {
        (self.bid_qty + self.ask_qty) / 2.0
    }

    pub fn total_qty(&self) -> f64 {
        self.bid_qty + self.ask_qty
    }
}

/// Discrete market condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Regime {
    #[default]
    Calm,
    Stressed,
    ExecutionHot,
    ManipulationSuspected,
}

impl Regime {
    pub fn id(self) -> u8 {
        match self {
            Regime::Calm => 0,
            Regime::Stressed => 1,
            Regime::ExecutionHot => 2,
            Regime::ManipulationSuspected => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Regime::Calm => "Calm",
            Regime::Stressed => "Stressed",
            Regime::ExecutionHot => "Execution Hot",
            Regime::ManipulationSuspected => "Manipulation Suspected",
        }
    }

}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Regime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

/// Anomaly type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    LiquidityGap,
    HeavyImbalance,
    SpreadShock,
    LargeOrder,
    Spoofing,
    DepthShock,
    Layering,
    MomentumIgnition,
    RegimeStress,
    RegimeCrisis,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::LiquidityGap => "LIQUIDITY_GAP",
            AnomalyKind::HeavyImbalance => "HEAVY_IMBALANCE",
            AnomalyKind::SpreadShock => "SPREAD_SHOCK",
            AnomalyKind::LargeOrder => "LARGE_ORDER",
            AnomalyKind::Spoofing => "SPOOFING",
            AnomalyKind::DepthShock => "DEPTH_SHOCK",
            AnomalyKind::Layering => "LAYERING",
            AnomalyKind::MomentumIgnition => "MOMENTUM_IGNITION",
            AnomalyKind::RegimeStress => "REGIME_STRESS",
            AnomalyKind::RegimeCrisis => "REGIME_CRISIS",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub message: String,
}

impl Anomaly {
    pub fn new(kind: AnomalyKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

/// Indicators derived from one snapshot.
///
/// Every field is populated on every call. `obi` and `spoofing_risk` are
/// explicitly absent when they cannot be computed; on the wire the absent
/// OBI is written as [`OBI_UNDEFINED`] and the absent risk as `null`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndicatorsRecord {
    pub timestamp: i64,
    pub mid_price: f64,
    pub spread: f64,
    pub ofi: f64,
    #[serde(serialize_with = "serialize_obi")]
    pub obi: Option<f64>,
    pub microprice: f64,
    pub divergence: f64,
    pub directional_prob: f64,
    pub regime: Regime,
    pub regime_label: &'static str,
    pub best_bid: f64,
    pub best_ask: f64,
    pub bid_qty: f64,
    pub ask_qty: f64,
    pub volatility: f64,
    pub spread_z: f64,
    pub liquidity_gap_count: u32,
    pub liquidity_gap_severity: u32,
    pub spoofing_risk: Option<f64>,
    pub anomalies: Vec<Anomaly>,
}

impl IndicatorsRecord {
    /// Inert record carrying only the snapshot's timestamp and mid price.
    /// A non-finite mid is written as 0.
    pub fn neutral(snapshot: &Snapshot) -> Self {
        let mid = if snapshot.mid_price.is_finite() {
            snapshot.mid_price
        } else {
            0.0
        };
        Self {
            timestamp: snapshot.timestamp,
            mid_price: mid,
            spread: 0.0,
            ofi: 0.0,
            obi: None,
            microprice: mid,
            divergence: 0.0,
            directional_prob: 50.0,
            regime: Regime::Calm,
            regime_label: Regime::Calm.label(),
            best_bid: 0.0,
            best_ask: 0.0,
            bid_qty: 0.0,
            ask_qty: 0.0,
            volatility: 0.0,
            spread_z: 0.0,
            liquidity_gap_count: 0,
            liquidity_gap_severity: 0,
            spoofing_risk: None,
            anomalies: Vec::new(),
        }
    }

    /// Neutral record that still reports the observed top of book.
    pub fn neutral_with_l1(snapshot: &Snapshot, l1: L1) -> Self {
        Self {
            best_bid: l1.bid_px,
            best_ask: l1.ask_px,
            bid_qty: l1.bid_qty,
            ask_qty: l1.ask_qty,
            ..Self::neutral(snapshot)
        }
    }

    /// OBI as the legacy wire value.
    pub fn obi_or_sentinel(&self) -> f64 {
        self.obi.unwrap_or(OBI_UNDEFINED)
    }

    pub fn has_anomaly(&self, kind: AnomalyKind) -> bool {
        self.anomalies.iter().any(|a| a.kind == kind)
    }
}

fn serialize_obi<S: Serializer>(obi: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(obi.unwrap_or(OBI_UNDEFINED))
}
