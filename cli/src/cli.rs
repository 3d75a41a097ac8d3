use std::path::PathBuf;

use clap::Parser;
use indicator_engine::{ConfigError, EngineConfig};

#[derive(Debug, Parser)]
#[clap(name = "indicators", version)]
pub struct Cli {
    /// JSON-lines file of snapshots; stdin when omitted
    #[clap(long)]
    pub input: Option<PathBuf>,

    /// Stream name recorded on the root span
    #[clap(long, default_value = "default")]
    pub stream: String,

    /// EWMA smoothing factor, overrides INDICATOR_ALPHA
    #[clap(long)]
    pub alpha: Option<f64>,

    /// Instrument tick size, overrides INDICATOR_TICK_SIZE
    #[clap(long)]
    pub tick_size: Option<f64>,

    /// Mid prices kept for volatility, overrides INDICATOR_PRICE_HISTORY
    #[clap(long)]
    pub price_history: Option<usize>,

    /// L1 volumes kept for spoofing risk, overrides INDICATOR_VOL_HISTORY
    #[clap(long)]
    pub vol_history: Option<usize>,

    /// Quantity change mapped to a full-scale OFI, overrides INDICATOR_OFI_SCALE
    #[clap(long)]
    pub ofi_scale: Option<f64>,

    /// Emit logs as JSON
    #[clap(long)]
    pub json_logs: bool,

    /// Snapshots buffered between the reader and the engine
    #[clap(long, default_value = "1024")]
    pub channel_capacity: usize,
}

impl Cli {
    /// Environment configuration with command-line overrides applied on top.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        self.apply(EngineConfig::from_env()?)
    }

    pub(crate) fn apply(&self, mut cfg: EngineConfig) -> Result<EngineConfig, ConfigError> {
        if let Some(v) = self.alpha {
            cfg.alpha = v;
        }
        if let Some(v) = self.tick_size {
            cfg.tick_size = v;
        }
        if let Some(v) = self.price_history {
            cfg.price_history_size = v;
        }
        if let Some(v) = self.vol_history {
            cfg.vol_history_size = v;
        }
        if let Some(v) = self.ofi_scale {
            cfg.ofi_scale = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
