//! Order-book microstructure indicators.
//!
//! One [`IndicatorEngine`] per snapshot stream turns each order-book
//! snapshot into an [`IndicatorsRecord`]: spread, order-flow and book
//! imbalance, microprice, a directional score, a market regime and anomaly
//! flags. The stages under [`pulse`] are pure functions and can be used on
//! their own.

pub mod config;
pub mod engine;
pub mod error;
pub mod ewma;
pub mod pulse;
pub mod rolling_window;
pub mod state;
pub mod types;
pub mod validation;

pub use config::EngineConfig;
pub use engine::IndicatorEngine;
pub use error::ConfigError;
pub use state::EngineState;
pub use types::{
    Anomaly, AnomalyKind, IndicatorsRecord, L1, Level, OBI_UNDEFINED, Regime, Severity, Snapshot,
};
pub use validation::Rejection;
