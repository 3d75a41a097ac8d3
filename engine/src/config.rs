use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // =========================
    // Smoothing
    // =========================
    /// EWMA smoothing factor for the spread, spread² and L1 volume baselines.
    ///
    /// Fixed for the lifetime of an engine. Must lie in (0, 1).
    pub alpha: f64,

    /// Warm-start value of the spread EWMA.
    pub spread_prior: f64,

    /// Warm-start value of the spread² EWMA.
    ///
    /// Keep it at `spread_prior²` so the running std starts at zero instead
    /// of a made-up dispersion.
    pub spread_sq_prior: f64,

    /// Warm-start value of the average L1 volume EWMA.
    pub l1_volume_prior: f64,

    // =========================
    // History windows
    // =========================
    /// Number of mid prices kept for realized volatility.
    pub price_history_size: usize,

    /// Number of L1 average volumes kept for the spoofing-risk score.
    pub vol_history_size: usize,

    // =========================
    // Instrument
    // =========================
    /// Minimum price increment. Scales microprice divergence before the
    /// directional sigmoid.
    pub tick_size: f64,

    /// Quantity change that maps to a full-scale OFI of ±1.
    pub ofi_scale: f64,

    /// Largest L1 price move still treated as "same price" when checking
    /// for a cancelled large order.
    pub spoof_price_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            spread_prior: 0.05,
            spread_sq_prior: 0.0025,
            l1_volume_prior: 10.0,
            price_history_size: 20,
            vol_history_size: 20,
            tick_size: 0.01,
            ofi_scale: 1000.0,
            spoof_price_tolerance: 0.001,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `INDICATOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values returned by `lookup`, then validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = parse_var(&lookup, "INDICATOR_ALPHA")? {
            cfg.alpha = v;
        }
        if let Some(v) = parse_var(&lookup, "INDICATOR_PRICE_HISTORY")? {
            cfg.price_history_size = v;
        }
        if let Some(v) = parse_var(&lookup, "INDICATOR_VOL_HISTORY")? {
            cfg.vol_history_size = v;
        }
        if let Some(v) = parse_var(&lookup, "INDICATOR_TICK_SIZE")? {
            cfg.tick_size = v;
        }
        if let Some(v) = parse_var(&lookup, "INDICATOR_OFI_SCALE")? {
            cfg.ofi_scale = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if self.price_history_size == 0 {
            return Err(ConfigError::EmptyWindow("price_history_size"));
        }
        if self.vol_history_size == 0 {
            return Err(ConfigError::EmptyWindow("vol_history_size"));
        }
        positive("tick_size", self.tick_size)?;
        positive("ofi_scale", self.ofi_scale)?;
        non_negative("spread_prior", self.spread_prior)?;
        non_negative("spread_sq_prior", self.spread_sq_prior)?;
        non_negative("l1_volume_prior", self.l1_volume_prior)?;
        non_negative("spoof_price_tolerance", self.spoof_price_tolerance)?;
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => {
            let parsed = raw.trim().parse::<T>();
            parsed
                .map(Some)
                .map_err(|_| ConfigError::InvalidEnv { var, value: raw })
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
