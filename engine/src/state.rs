use crate::config::EngineConfig;
use crate::ewma::{Ewma, EwmaMoments};
use crate::pulse::anomaly::SideDepth;
use crate::rolling_window::RollingWindow;
use crate::types::{L1, Regime};

/// Running state of one engine.
///
/// Read by every stage during a call and written once, through
/// [`EngineState::commit`], after the record is built.
#[derive(Clone, Debug)]
pub struct EngineState {
    prev_l1: Option<L1>,
    spread: EwmaMoments,
    l1_volume: Ewma,
    prices: RollingWindow,
    volumes: RollingWindow,
    spoofing_events: u64,
    momentum_bursts: u64,
    prev_depth: SideDepth,
    last_regime: Regime,
    processed: u64,
}

/// Everything a successful call folds into the state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StateUpdate {
    pub l1: L1,
    pub spread: f64,
    pub mid_price: f64,
    pub l1_volume: f64,
    pub new_spoofing_events: u64,
    pub momentum_burst: bool,
    pub depth: SideDepth,
    pub regime: Regime,
}

impl EngineState {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            prev_l1: None,
            spread: EwmaMoments::new(cfg.spread_prior, cfg.spread_sq_prior, cfg.alpha),
            l1_volume: Ewma::new(cfg.l1_volume_prior, cfg.alpha),
            prices: RollingWindow::new(cfg.price_history_size),
            volumes: RollingWindow::new(cfg.vol_history_size),
            spoofing_events: 0,
            momentum_bursts: 0,
            prev_depth: SideDepth::default(),
            last_regime: Regime::Calm,
            processed: 0,
        }
    }

    /// Top of book from the last successful call.
    pub fn prev_l1(&self) -> Option<&L1> {
        self.prev_l1.as_ref()
    }

    pub fn spread_moments(&self) -> &EwmaMoments {
        &self.spread
    }

    pub fn l1_volume_baseline(&self) -> f64 {
        self.l1_volume.value()
    }

    pub fn prices(&self) -> &RollingWindow {
        &self.prices
    }

    pub fn volumes(&self) -> &RollingWindow {
        &self.volumes
    }

    pub fn spoofing_events(&self) -> u64 {
        self.spoofing_events
    }

    /// Aggressive momentum bursts seen so far.
    pub fn momentum_bursts(&self) -> u64 {
        self.momentum_bursts
    }

    pub fn prev_depth(&self) -> &SideDepth {
        &self.prev_depth
    }

    pub fn last_regime(&self) -> Regime {
        self.last_regime
    }

    /// Successful calls folded in so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub(crate) fn commit(&mut self, update: StateUpdate) {
        self.prev_l1 = Some(update.l1);
        self.spread.update(update.spread);
        self.l1_volume.update(update.l1_volume);
        self.prices.push(update.mid_price);
        self.volumes.push(update.l1_volume);
        self.spoofing_events = self.spoofing_events.saturating_add(update.new_spoofing_events);
        self.momentum_bursts += u64::from(update.momentum_burst);
        self.prev_depth = update.depth;
        self.last_regime = update.regime;
        self.processed += 1;
    }
}
